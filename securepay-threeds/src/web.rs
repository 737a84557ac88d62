//! Web challenge fallback for 3-D Secure version 1.
//!
//! The access control server page is loaded with a form POST of `PaReq`,
//! `TermUrl` and `MD`. The challenge is over once the page navigates to the
//! term URL: the query then carries `MD` back together with `PaRes`.

use async_trait::async_trait;
use securepay_log::{Monitor, Severity};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

use crate::{ChallengeError, ChallengeResult, Result, ToolbarCustomization};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebMethod {
    Get,
    Post,
}

/// Page the web transport should present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPage {
    pub method: WebMethod,
    pub url: Url,
    /// Form-encoded body for POST pages
    pub form_body: Option<String>,
    pub title: String,
    pub cancel_text: String,
}

impl WebPage {
    pub fn get(url: Url, toolbar: &ToolbarCustomization) -> Self {
        Self {
            method: WebMethod::Get,
            url,
            form_body: None,
            title: toolbar.header_text_or_default().to_string(),
            cancel_text: toolbar.button_text_or_default().to_string(),
        }
    }
}

/// What the presented page reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebEvent {
    /// The page is about to navigate
    Navigated(Url),
    /// A response arrived with this status
    HttpStatus(u16),
    /// The page finished loading with insecure content
    InsecureContent,
    /// The customer closed the page
    Dismissed,
}

/// Embedded browser seam.
///
/// `present` shows the page and returns; events then flow through the
/// channel until the page is dismissed or the sender is dropped.
#[async_trait]
pub trait WebTransport: Send + Sync {
    async fn present(&self, page: WebPage, events: mpsc::UnboundedSender<WebEvent>) -> Result<()>;

    async fn dismiss(&self);
}

/// What follows `target` in `url`, with both in normalized form.
///
/// `None` when `url` does not start with `target` or `target` is not a
/// valid URL.
pub fn strip_target<'a>(url: &'a Url, target: &str) -> Option<&'a str> {
    let target = Url::parse(target).ok()?;
    url.as_str().strip_prefix(target.as_str())
}

/// Inputs of one version 1 challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebChallengeRequest {
    pub payload: String,
    pub term_url: String,
    pub acs_url: String,
    pub md: String,
}

impl WebChallengeRequest {
    pub fn new(
        payload: impl Into<String>,
        term_url: impl Into<String>,
        acs_url: impl Into<String>,
        md: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            term_url: term_url.into(),
            acs_url: acs_url.into(),
            md: md.into(),
        }
    }

    /// `PaReq`, `TermUrl` and `MD`, form-encoded.
    pub fn form_body(&self) -> Result<String> {
        serde_urlencoded::to_string([
            ("PaReq", self.payload.as_str()),
            ("TermUrl", self.term_url.as_str()),
            ("MD", self.md.as_str()),
        ])
        .map_err(|e| ChallengeError::Web(e.to_string()))
    }

    pub fn page(&self, toolbar: &ToolbarCustomization) -> Result<WebPage> {
        let url = Url::parse(&self.acs_url)
            .map_err(|e| ChallengeError::Web(format!("invalid ACS URL: {}", e)))?;
        Ok(WebPage {
            method: WebMethod::Post,
            url,
            form_body: Some(self.form_body()?),
            title: toolbar.header_text_or_default().to_string(),
            cancel_text: toolbar.button_text_or_default().to_string(),
        })
    }

    /// Outcome signalled by a navigation, if it ends the challenge.
    pub fn evaluate_navigation(&self, url: &Url) -> Option<ChallengeResult> {
        let rest = strip_target(url, &self.term_url)?;
        if rest.is_empty() {
            return None;
        }

        let mut md = None;
        let mut pares = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "MD" if md.is_none() => md = Some(value.into_owned()),
                "PaRes" if pares.is_none() => pares = Some(value.into_owned()),
                _ => {}
            }
        }

        match (md, pares) {
            (Some(md), Some(pares)) if md == self.md => Some(ChallengeResult::Validated(pares)),
            _ => Some(ChallengeResult::Failed),
        }
    }
}

/// Runs version 1 challenges over a [`WebTransport`].
#[derive(Clone)]
pub struct WebChallengeFallback {
    transport: Arc<dyn WebTransport>,
    toolbar: ToolbarCustomization,
    monitor: Monitor,
}

impl WebChallengeFallback {
    pub fn new(transport: Arc<dyn WebTransport>, toolbar: ToolbarCustomization, monitor: Monitor) -> Self {
        Self {
            transport,
            toolbar,
            monitor,
        }
    }

    pub async fn run(&self, request: &WebChallengeRequest) -> Result<ChallengeResult> {
        if request.term_url.is_empty() {
            return Err(ChallengeError::Web("missing term URL".to_string()));
        }
        Url::parse(&request.term_url)
            .map_err(|e| ChallengeError::Web(format!("invalid term URL: {}", e)))?;
        let page = request.page(&self.toolbar)?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        self.transport.present(page, tx).await?;
        debug!("Web challenge presented");

        let result = loop {
            match rx.recv().await {
                Some(WebEvent::Navigated(url)) => {
                    if let Some(result) = request.evaluate_navigation(&url) {
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
                Some(WebEvent::InsecureContent) => {
                    warn!("Web challenge loaded insecure content");
                    break ChallengeResult::Failed;
                }
                Some(WebEvent::Dismissed) | None => break ChallengeResult::Failed,
            }
        };

        self.transport.dismiss().await;
        Ok(result)
    }
}

impl std::fmt::Debug for WebChallengeFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebChallengeFallback")
            .field("toolbar", &self.toolbar)
            .finish()
    }
}
