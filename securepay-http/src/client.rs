//! Gateway client implementation.

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::{
    GatewayClientConfig, GatewayError, GatewayRequest, GatewayResponse, GatewayTransport,
    ReqwestTransport, Result, RetryStrategy,
};

/// Token exchange client with retry and an overall time ceiling.
#[derive(Clone)]
pub struct GatewayClient {
    transport: Arc<dyn GatewayTransport>,
    config: Arc<GatewayClientConfig>,
    endpoint: Url,
}

impl GatewayClient {
    /// Create a client backed by `reqwest`.
    pub fn new(config: GatewayClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(
        config: GatewayClientConfig,
        transport: Arc<dyn GatewayTransport>,
    ) -> Result<Self> {
        let endpoint = config.endpoint()?;
        Ok(Self {
            transport,
            config: Arc::new(config),
            endpoint,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &GatewayClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Exchange `jwt` and the request objects for a decoded gateway answer.
    pub async fn send<R: Serialize>(&self, jwt: &str, requests: &[R]) -> Result<GatewayResponse> {
        let body = GatewayRequest::new(
            &self.config.username,
            jwt,
            &self.config.version_info,
            requests,
        )
        .to_vec()?;

        let ceiling = self.config.retry.max_request_time;
        let payload = tokio::time::timeout(ceiling, self.execute_with_retry(Bytes::from(body)))
            .await
            .map_err(|_| {
                warn!(timeout = ?ceiling, "Gateway request exceeded its time ceiling");
                GatewayError::Timeout(ceiling)
            })??;

        GatewayResponse::from_body(&payload)
    }

    /// Execute request with retry logic.
    async fn execute_with_retry(&self, body: Bytes) -> Result<Bytes> {
        let retry = &self.config.retry;
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            match self.transport.send(&self.endpoint, body.clone()).await {
                Ok(payload) => {
                    if attempt > 0 {
                        debug!(attempts = attempt + 1, "Gateway request succeeded after retry");
                    }
                    return Ok(payload);
                }
                Err(e) => {
                    if retry.should_retry(attempt, start.elapsed(), &e) {
                        debug!(
                            attempt = attempt + 1,
                            error = %e,
                            "Retrying gateway request due to error"
                        );
                        tokio::time::sleep(retry.retry_delay(attempt)).await;
                        attempt += 1;
                        continue;
                    }

                    warn!(attempts = attempt + 1, error = %e, "Gateway request failed");
                    return Err(e);
                }
            }
        }
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("gateway", &self.config.gateway)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GatewayType, RetryPolicy};
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        let config = GatewayClientConfig::builder(GatewayType::Eu, "merchant")
            .build()
            .unwrap();
        let client = GatewayClient::new(config).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://webservices.securetrading.net/jwt/"
        );
    }

    #[test]
    fn test_client_with_config() {
        let config = GatewayClientConfig::builder(GatewayType::Devbox, "merchant")
            .base_url("http://localhost:9000")
            .retry(RetryPolicy::new(3, Duration::from_secs(5)))
            .build()
            .unwrap();

        let client = GatewayClient::new(config).unwrap();
        assert_eq!(client.config().retry.max_attempts(), 4);
        assert_eq!(client.endpoint().as_str(), "http://localhost:9000/jwt/");
    }
}
