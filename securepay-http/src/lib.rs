//! # SecurePay HTTP
//!
//! Client for the gateway's token exchange endpoint: every call posts the
//! merchant's token with a batch of request objects and gets back a
//! re-signed response token.
//!
//! ## Features
//!
//! - **Retry**: transient network failures are re-sent up to `max_retries`
//!   times while the retry window is open
//! - **Time ceiling**: the whole exchange is bounded by `max_request_time`
//! - **Certificate pinning**: production gateways only accept chains that
//!   carry one of their pinned public keys
//! - **Transport seam**: [`GatewayTransport`] can be replaced in tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use securepay_http::{GatewayClient, GatewayClientConfig, GatewayType};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayClientConfig::builder(GatewayType::Eu, "merchant@example.com").build()?;
//!     let client = GatewayClient::new(config)?;
//!
//!     let requests = [json!({"requesttypedescriptions": ["JSINIT"]})];
//!     let response = client.send("merchant.signed.token", &requests).await?;
//!
//!     println!("next token: {}", response.new_jwt);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod gateway;
pub mod pinning;
mod request;
mod retry;
mod transport;

pub use client::GatewayClient;
pub use config::{
    GatewayClientConfig, GatewayClientConfigBuilder, JWT_ENDPOINT, default_version_info,
};
pub use error::{GatewayError, Result, TransportError, TransportErrorKind};
pub use gateway::GatewayType;
pub use pinning::{PinnedCertVerifier, pinned_client_config};
pub use request::{ACCEPT_CUSTOMER_OUTPUT, API_VERSION, GatewayRequest, GatewayResponse};
pub use retry::{BackoffStrategy, RetryPolicy, RetryStrategy};
pub use transport::{GatewayTransport, ReqwestTransport};
