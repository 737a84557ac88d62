//! Error types for transaction processing

use securepay_http::GatewayError;
use securepay_threeds::{ChallengeError, SecurityWarning};
use thiserror::Error;

/// Result type for transaction operations
pub type Result<T> = std::result::Result<T, TransactionError>;

/// A local check on a request or on the gateway's answer failed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseValidationError {
    /// A value the flow depends on was absent
    #[error("Missing data")]
    MissingData,

    /// The gateway answered without any response object
    #[error("Missing response")]
    MissingResponse,

    /// The gateway answered outside 2xx
    #[error("Unacceptable status code: {0}")]
    UnacceptableStatusCode(u16),

    #[error("Missing JWT")]
    MissingJwt,

    /// The token names no request types
    #[error("Missing request type descriptions")]
    MissingTypeDescriptions,

    /// A 3-D Secure v1 challenge needs a term URL in the token
    #[error("Missing term URL")]
    MissingTermUrl,

    /// An APM transaction needs a valid return URL in the token
    #[error("Missing or invalid return URL")]
    MissingReturnUrl,
}

impl ResponseValidationError {
    pub fn code(&self) -> i32 {
        match self {
            Self::MissingData => 12200,
            Self::MissingResponse => 12300,
            Self::UnacceptableStatusCode(_) => 12400,
            Self::MissingJwt => 12500,
            Self::MissingTypeDescriptions => 12600,
            Self::MissingTermUrl => 12700,
            Self::MissingReturnUrl => 12800,
        }
    }
}

/// Error returned with a completed transaction.
///
/// Errors declared by the gateway inside a response token are not part of
/// this type: they travel in the returned tokens, see
/// [`TransactionOutcome::payment_errors`](crate::TransactionOutcome::payment_errors).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The request could not be built
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// Network failure, retries exhausted
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Response validation error: {0}")]
    ResponseValidation(#[from] ResponseValidationError),

    /// The gateway answer could not be decoded
    #[error("Failed to parse response: {0}")]
    ResponseParse(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("{0}")]
    Custom(String),

    #[error("Unknown error")]
    Unknown,

    /// No token was available for the request
    #[error("JWT missing")]
    JwtMissing,

    #[error("Gateway inaccessible")]
    Inaccessible,

    /// The challenge SDK rejected the session setup
    #[error("Challenge setup failed: {0}")]
    ChallengeSetupInternal(String),

    /// The customer did not pass the issuer challenge
    #[error("Challenge authentication failed")]
    ChallengeAuthentication,

    /// The APM provider reported the payment as cancelled
    #[error("APM settlement rejected")]
    ApmSettleStatus,
}

impl TransactionError {
    /// Stable numeric code reported to merchants
    pub fn code(&self) -> i32 {
        match self {
            Self::RequestBuild(_) => 10000,
            Self::Connection(_) => 11000,
            Self::ResponseValidation(e) => e.code(),
            Self::ResponseParse(_) => 13000,
            Self::Server(_) => 14000,
            Self::Custom(_) => 15000,
            Self::Unknown => 16000,
            Self::JwtMissing => 17000,
            Self::Inaccessible => 20000,
            Self::ChallengeSetupInternal(_) => 1010,
            Self::ChallengeAuthentication => 21000,
            Self::ApmSettleStatus => 24000,
        }
    }

    pub(crate) fn missing_data() -> Self {
        Self::ResponseValidation(ResponseValidationError::MissingData)
    }
}

impl From<GatewayError> for TransactionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::RequestBuild(_) | GatewayError::InvalidUrl(_) => {
                Self::RequestBuild(err.to_string())
            }
            GatewayError::Transport(_) | GatewayError::Timeout(_) | GatewayError::Tls(_) => {
                Self::Connection(err.to_string())
            }
            GatewayError::UnacceptableStatusCode(status) => Self::ResponseValidation(
                ResponseValidationError::UnacceptableStatusCode(status),
            ),
            GatewayError::MissingData(_) => Self::missing_data(),
            GatewayError::ResponseParse(message) => Self::ResponseParse(message),
        }
    }
}

impl From<ChallengeError> for TransactionError {
    fn from(err: ChallengeError) -> Self {
        match err {
            ChallengeError::Setup(message) => Self::ChallengeSetupInternal(message),
            ChallengeError::Web(_) => Self::ChallengeAuthentication,
            ChallengeError::InvalidState { .. } => Self::Unknown,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

/// Why a transaction manager could not be created
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Missing username")]
    MissingUsername,

    #[error("Missing gateway")]
    MissingGateway,

    #[error("Missing environment")]
    MissingEnvironment,

    /// The device failed the security gate
    #[error("3DS Security warnings detected: {}", describe(.0))]
    SecurityWarnings(Vec<SecurityWarning>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway client could not be built
    #[error("Gateway client error: {0}")]
    Client(#[from] GatewayError),
}

impl InitError {
    pub fn code(&self) -> i32 {
        match self {
            Self::MissingUsername
            | Self::MissingGateway
            | Self::MissingEnvironment
            | Self::Config(_) => 9000,
            Self::SecurityWarnings(_) => 9100,
            Self::Client(e) => e.code(),
        }
    }
}

fn describe(warnings: &[SecurityWarning]) -> String {
    warnings
        .iter()
        .map(SecurityWarning::description)
        .collect::<Vec<_>>()
        .join(", ")
}
