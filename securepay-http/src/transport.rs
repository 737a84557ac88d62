//! Network transport seam.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;
use url::Url;

use crate::pinning::pinned_client_config;
use crate::{GatewayClientConfig, GatewayError, Result};

/// Sends one request body and returns the body of a 2xx answer.
///
/// Implementations map network failures to [`GatewayError::Transport`] and
/// non-2xx answers to [`GatewayError::UnacceptableStatusCode`]; retrying is
/// left to the caller.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn send(&self, url: &Url, body: Bytes) -> Result<Bytes>;
}

/// `reqwest` transport, pinned when the configuration asks for it.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &GatewayClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.retry.max_request_time)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none());

        if config.pinning_enabled() {
            debug!(gateway = %config.gateway, "Certificate pinning enabled");
            builder = builder.use_preconfigured_tls(pinned_client_config(config.gateway.pins())?);
        }

        let inner = builder
            .build()
            .map_err(|e| GatewayError::RequestBuild(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl GatewayTransport for ReqwestTransport {
    async fn send(&self, url: &Url, body: Bytes) -> Result<Bytes> {
        let response = self
            .inner
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Gateway answered outside 2xx");
            return Err(GatewayError::UnacceptableStatusCode(status.as_u16()));
        }

        Ok(response.bytes().await?)
    }
}
