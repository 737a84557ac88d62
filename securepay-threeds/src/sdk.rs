//! Vendor challenge SDK boundary.
//!
//! The vendor SDK is callback driven. Each callback is an `FnOnce`, so a
//! session can signal its outcome at most once; an implementation that drops
//! a callback without calling it is treated as a failed session.

use std::fmt;

use crate::{ChallengeConfig, VendorWarning};

/// Overall outcome reported by the vendor for a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionCode {
    Success,
    NoAction,
    Failure,
    Error,
    Cancel,
    Timeout,
    /// A code introduced by a later vendor release
    Unknown(String),
}

impl ActionCode {
    pub fn from_vendor(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "NOACTION" => Self::NoAction,
            "FAILURE" => Self::Failure,
            "ERROR" => Self::Error,
            "CANCEL" => Self::Cancel,
            "TIMEOUT" => Self::Timeout,
            _ => Self::Unknown(code.to_string()),
        }
    }

    /// Whether the server token should be forwarded to the gateway.
    pub fn is_validated(&self) -> bool {
        matches!(self, Self::Success | Self::NoAction)
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::NoAction => f.write_str("NOACTION"),
            Self::Failure => f.write_str("FAILURE"),
            Self::Error => f.write_str("ERROR"),
            Self::Cancel => f.write_str("CANCEL"),
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::Unknown(code) => f.write_str(code),
        }
    }
}

/// Vendor response attached to setup failures and challenge outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateResponse {
    pub action_code: ActionCode,
    pub error_number: i64,
    pub error_description: String,
}

impl ValidateResponse {
    pub fn new(action_code: ActionCode) -> Self {
        Self {
            action_code,
            error_number: 0,
            error_description: String::new(),
        }
    }

    pub fn with_error(mut self, number: i64, description: impl Into<String>) -> Self {
        self.error_number = number;
        self.error_description = description.into();
        self
    }
}

/// Outcome of a session setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    Completed { session_id: String },
    Failed(ValidateResponse),
}

pub type SetupCallback = Box<dyn FnOnce(SetupOutcome) + Send + 'static>;

/// Called with the vendor response and, on success, the server token.
pub type ValidationCallback = Box<dyn FnOnce(ValidateResponse, Option<String>) + Send + 'static>;

/// Challenge SDK supplied by the 3-D Secure vendor.
pub trait ChallengeSdk: Send + Sync {
    fn configure(&self, config: &ChallengeConfig);

    fn warnings(&self) -> Vec<VendorWarning>;

    /// Start a session from the device-init token.
    fn setup(&self, jwt: &str, callback: SetupCallback);

    /// Present the issuer challenge for a transaction.
    fn continue_challenge(&self, transaction_id: &str, payload: &str, callback: ValidationCallback);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_codes() {
        assert_eq!(ActionCode::from_vendor("SUCCESS"), ActionCode::Success);
        assert_eq!(ActionCode::from_vendor("noaction"), ActionCode::NoAction);
        assert_eq!(
            ActionCode::from_vendor("PARTIAL"),
            ActionCode::Unknown("PARTIAL".to_string())
        );

        assert!(ActionCode::Success.is_validated());
        assert!(ActionCode::NoAction.is_validated());
        for code in [
            ActionCode::Failure,
            ActionCode::Error,
            ActionCode::Cancel,
            ActionCode::Timeout,
            ActionCode::Unknown("X".to_string()),
        ] {
            assert!(!code.is_validated(), "{}", code);
        }
    }
}
