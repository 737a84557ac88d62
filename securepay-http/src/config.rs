//! Gateway client configuration.

use std::time::Duration;
use url::Url;

use crate::{GatewayError, GatewayType, Result, RetryPolicy};

/// Path of the token exchange endpoint, relative to the base URL.
pub const JWT_ENDPOINT: &str = "jwt/";

/// `MSDK::rust::<sdk version>::<os>`
pub fn default_version_info() -> String {
    format!(
        "MSDK::rust::{}::{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

/// Gateway client configuration.
#[derive(Debug, Clone)]
pub struct GatewayClientConfig {
    /// Gateway the merchant account lives on.
    pub gateway: GatewayType,
    /// Base URL, normally derived from the gateway.
    pub base_url: Url,
    /// Merchant username sent as `alias`.
    pub username: String,
    /// Retry and timeout bounds.
    pub retry: RetryPolicy,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Value of the `versioninfo` request field.
    pub version_info: String,
}

impl GatewayClientConfig {
    /// Create a new configuration builder.
    pub fn builder(gateway: GatewayType, username: impl Into<String>) -> GatewayClientConfigBuilder {
        GatewayClientConfigBuilder {
            gateway,
            username: username.into(),
            base_url: None,
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("securepay-http/{}", env!("CARGO_PKG_VERSION")),
            version_info: default_version_info(),
        }
    }

    /// Pinned gateways are always reached over https, so this follows the gateway.
    pub fn pinning_enabled(&self) -> bool {
        self.gateway.is_pinned()
    }

    /// Absolute URL of the token exchange endpoint.
    pub fn endpoint(&self) -> Result<Url> {
        Ok(self.base_url.join(JWT_ENDPOINT)?)
    }
}

/// Builder for gateway client configuration.
#[derive(Debug)]
pub struct GatewayClientConfigBuilder {
    gateway: GatewayType,
    username: String,
    base_url: Option<String>,
    retry: RetryPolicy,
    connect_timeout: Duration,
    user_agent: String,
    version_info: String,
}

impl GatewayClientConfigBuilder {
    /// Override the gateway's base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set retry and timeout bounds.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn version_info(mut self, version_info: impl Into<String>) -> Self {
        self.version_info = version_info.into();
        self
    }

    /// Build the configuration.
    ///
    /// Only the development gateway may be reached over plain http.
    pub fn build(self) -> Result<GatewayClientConfig> {
        let base_url = match self.base_url {
            Some(url) => Url::parse(&url)?,
            None => Url::parse(&self.gateway.base_url())?,
        };
        if self.gateway.is_pinned() && base_url.scheme() != "https" {
            return Err(GatewayError::Tls(format!(
                "gateway {} requires an https base URL, got {}",
                self.gateway, base_url
            )));
        }

        Ok(GatewayClientConfig {
            gateway: self.gateway,
            base_url,
            username: self.username,
            retry: self.retry,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent,
            version_info: self.version_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_gateway() {
        let config = GatewayClientConfig::builder(GatewayType::Us, "merchant")
            .build()
            .unwrap();

        assert_eq!(config.base_url.as_str(), "https://webservices.securetrading.us/");
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://webservices.securetrading.us/jwt/"
        );
        assert!(config.pinning_enabled());
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.version_info.starts_with("MSDK::rust::"));
    }

    #[test]
    fn test_devbox_skips_pinning() {
        let local = GatewayClientConfig::builder(GatewayType::Devbox, "merchant")
            .base_url("http://127.0.0.1:8080")
            .build()
            .unwrap();
        assert!(!local.pinning_enabled());
        assert_eq!(local.endpoint().unwrap().as_str(), "http://127.0.0.1:8080/jwt/");

        let devbox = GatewayClientConfig::builder(GatewayType::Devbox, "merchant")
            .build()
            .unwrap();
        assert!(!devbox.pinning_enabled());
    }

    #[test]
    fn test_pinned_gateways_reject_plain_http() {
        for gateway in [GatewayType::Eu, GatewayType::EuBackup, GatewayType::Us] {
            let result = GatewayClientConfig::builder(gateway, "merchant")
                .base_url("http://webservices.securetrading.net")
                .build();
            assert!(matches!(result, Err(GatewayError::Tls(_))), "{gateway}");
        }

        let proxied = GatewayClientConfig::builder(GatewayType::Eu, "merchant")
            .base_url("https://gateway-proxy.example.com")
            .build()
            .unwrap();
        assert!(proxied.pinning_enabled());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = GatewayClientConfig::builder(GatewayType::Eu, "merchant")
            .base_url("not a url")
            .build();
        assert!(matches!(result, Err(crate::GatewayError::InvalidUrl(_))));
    }
}
