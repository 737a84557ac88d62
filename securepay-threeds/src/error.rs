//! Challenge error types.

use thiserror::Error;

use crate::ChallengeState;

/// Result type for challenge operations.
pub type Result<T> = std::result::Result<T, ChallengeError>;

/// Challenge errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChallengeError {
    /// The vendor rejected the session setup.
    #[error("Challenge setup failed: {0}")]
    Setup(String),

    /// An operation was attempted out of order.
    #[error("Invalid challenge state: expected {expected}, found {actual}")]
    InvalidState {
        expected: ChallengeState,
        actual: ChallengeState,
    },

    /// The web challenge could not be presented.
    #[error("Web challenge error: {0}")]
    Web(String),
}
