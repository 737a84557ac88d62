//! # SecurePay Transactions
//!
//! Orchestrates card, wallet and APM transactions against the SecurePay
//! gateway, running 3-D Secure challenges when the gateway asks for them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use securepay_transaction::*;
//! use securepay_http::GatewayType;
//!
//! let config = SdkConfig::builder()
//!     .username("merchant@example.com")
//!     .gateway(GatewayType::Eu)
//!     .environment(Environment::Staging)
//!     .build();
//!
//! // the challenge SDK and the web transport come from the platform layer
//! let deps = TransactionDeps::new(challenge_sdk, web_transport);
//! let mut manager = PaymentTransactionManager::new(config, Some(merchant_jwt), deps)?;
//!
//! let card = Card::new("4111111111111111", "123", "12/30");
//! let outcome = manager.perform_transaction(None, Some(card)).await;
//!
//! for error in outcome.payment_errors() {
//!     println!("declined: {}", error);
//! }
//! ```
//!
//! ## Configuration
//!
//! [`SdkConfig`] can also be read from a file with [`ConfigLoader`] or from
//! `SECUREPAY_*` environment variables with [`EnvLoader`].

pub mod apm;
mod card;
pub mod config;
mod error;
mod fingerprint;
mod manager;
mod outcome;
mod request;

pub use apm::{ApmRedirect, ApmResult, ApmWebFlow};
pub use card::Card;
pub use config::{
    ConfigLoader, ENV_PREFIX, EnvLoader, Environment, FileFormat, RetrySettings, SdkConfig,
    SdkConfigBuilder,
};
pub use error::{ConfigError, InitError, ResponseValidationError, Result, TransactionError};
pub use fingerprint::FingerprintProvider;
pub use manager::{PaymentTransactionManager, TransactionDeps, TransactionState};
pub use outcome::{AdditionalTransactionResult, TransactionOutcome};
pub use request::{Apm, ChallengePayload, RequestObject, WalletSource};
