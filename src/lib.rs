// SecurePay - client-side payment SDK core
//
// This library bundles the gateway client, the transaction orchestrator and
// the 3-D Secure challenge handling behind feature flags.

// Logging and monitoring are always available
pub use securepay_log as log;

// Re-export optional crates
#[cfg(feature = "token")]
pub use securepay_token;

#[cfg(feature = "http")]
pub use securepay_http;

#[cfg(feature = "threeds")]
pub use securepay_threeds;

#[cfg(feature = "transaction")]
pub use securepay_transaction;

/// Commonly used items for running transactions
#[cfg(feature = "transaction")]
pub mod prelude {
    pub use securepay_http::{GatewayType, RetryPolicy};
    pub use securepay_threeds::{ChallengeSdk, WebEvent, WebPage, WebTransport};
    pub use securepay_transaction::{
        AdditionalTransactionResult, Apm, Card, Environment, PaymentTransactionManager, SdkConfig,
        TransactionDeps, TransactionError, TransactionOutcome, WalletSource,
    };
}
