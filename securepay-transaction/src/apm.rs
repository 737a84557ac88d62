//! APM redirect handling.
//!
//! The provider's page is shown over a [`WebTransport`]. The flow ends when
//! the page navigates back to the merchant's return URL, which then carries
//! `settlestatus` and `transactionreference`.

use securepay_log::{Monitor, Severity};
use securepay_threeds::{
    ChallengeError, ToolbarCustomization, WebEvent, WebPage, WebTransport, strip_target,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// How the customer left the provider's page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApmResult {
    Settled {
        settle_status: String,
        transaction_reference: String,
    },
    Failed,
}

/// One redirect to an APM provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApmRedirect {
    pub redirect_url: Url,
    pub return_url: String,
}

impl ApmRedirect {
    pub fn new(redirect_url: Url, return_url: impl Into<String>) -> Self {
        Self {
            redirect_url,
            return_url: return_url.into(),
        }
    }

    /// Outcome signalled by a navigation, if it ends the redirect.
    pub fn evaluate_navigation(&self, url: &Url) -> Option<ApmResult> {
        strip_target(url, &self.return_url)?;

        let mut settle_status = None;
        let mut transaction_reference = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "settlestatus" if settle_status.is_none() => settle_status = Some(value.into_owned()),
                "transactionreference" if transaction_reference.is_none() => {
                    transaction_reference = Some(value.into_owned())
                }
                _ => {}
            }
        }

        Some(match (settle_status, transaction_reference) {
            (Some(settle_status), Some(transaction_reference)) => ApmResult::Settled {
                settle_status,
                transaction_reference,
            },
            _ => ApmResult::Failed,
        })
    }
}

/// Runs APM redirects over a [`WebTransport`]
#[derive(Clone)]
pub struct ApmWebFlow {
    transport: Arc<dyn WebTransport>,
    toolbar: ToolbarCustomization,
    monitor: Monitor,
}

impl ApmWebFlow {
    pub fn new(transport: Arc<dyn WebTransport>, toolbar: ToolbarCustomization, monitor: Monitor) -> Self {
        Self {
            transport,
            toolbar,
            monitor,
        }
    }

    pub async fn run(&self, redirect: &ApmRedirect) -> Result<ApmResult, ChallengeError> {
        let page = WebPage::get(redirect.redirect_url.clone(), &self.toolbar);

        let (tx, mut rx) = mpsc::unbounded_channel();
        self.transport.present(page, tx).await?;

        let result = loop {
            match rx.recv().await {
                Some(WebEvent::Navigated(url)) => {
                    if let Some(result) = redirect.evaluate_navigation(&url) {
                        break result;
                    }
                }
                Some(WebEvent::HttpStatus(status)) => {
                    if (400..=599).contains(&status) {
                        self.monitor.log(
                            Severity::Error,
                            &format!("Network error: {}", status),
                            &[],
                        );
                    }
                }
                Some(WebEvent::InsecureContent) => {}
                Some(WebEvent::Dismissed) | None => break ApmResult::Failed,
            }
        };

        self.transport.dismiss().await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect() -> ApmRedirect {
        ApmRedirect::new(
            Url::parse("https://zip.example.com/checkout").unwrap(),
            "https://merchant.example.com/return",
        )
    }

    fn url(value: &str) -> Url {
        Url::parse(value).unwrap()
    }

    #[test]
    fn test_navigation_evaluation() {
        let redirect = redirect();

        assert_eq!(
            redirect.evaluate_navigation(&url("https://zip.example.com/step")),
            None
        );
        assert_eq!(
            redirect.evaluate_navigation(&url(
                "https://merchant.example.com/return?settlestatus=0&transactionreference=1-2-3"
            )),
            Some(ApmResult::Settled {
                settle_status: "0".to_string(),
                transaction_reference: "1-2-3".to_string(),
            })
        );
        assert_eq!(
            redirect.evaluate_navigation(&url("https://merchant.example.com/return?settlestatus=3")),
            Some(ApmResult::Failed)
        );
    }

    #[test]
    fn test_return_url_matched_after_normalization() {
        let redirect = ApmRedirect::new(
            Url::parse("https://zip.example.com/checkout").unwrap(),
            "HTTPS://Merchant.example.com:443/return",
        );

        assert_eq!(
            redirect.evaluate_navigation(&url(
                "https://merchant.example.com/return?settlestatus=0&transactionreference=1-2-3"
            )),
            Some(ApmResult::Settled {
                settle_status: "0".to_string(),
                transaction_reference: "1-2-3".to_string(),
            })
        );
        assert_eq!(
            redirect.evaluate_navigation(&url("https://other.example.com/return?settlestatus=0")),
            None
        );
    }
}
