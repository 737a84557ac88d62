// Error types for token operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Malformed token: expected 3 segments, found {segments}")]
    MalformedToken { segments: usize },

    #[error("Invalid base64url encoding in token segment")]
    InvalidEncoding,

    #[error("Invalid token payload: {0}")]
    InvalidPayload(String),

    #[error("Token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TokenError {
    /// Stable numeric code reported to merchants
    pub fn code(&self) -> i32 {
        match self {
            TokenError::MalformedToken { .. } => 17300,
            TokenError::InvalidEncoding => 17100,
            TokenError::InvalidPayload(_) => 17200,
            TokenError::Signing(_) | TokenError::Serialization(_) => 17000,
        }
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;
