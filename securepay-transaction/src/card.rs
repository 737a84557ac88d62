//! Card details entered by the customer.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Card data for one transaction.
///
/// Values are held as secrets and only exposed while a request body is
/// built. Validation of the number against card brands happens before the
/// card reaches the SDK.
#[derive(Clone, Default)]
pub struct Card {
    pan: Option<SecretString>,
    security_code: Option<SecretString>,
    expiry_date: Option<SecretString>,
}

impl Card {
    pub fn new(
        pan: impl Into<String>,
        security_code: impl Into<String>,
        expiry_date: impl Into<String>,
    ) -> Self {
        Self::default()
            .with_pan(pan)
            .with_security_code(security_code)
            .with_expiry_date(expiry_date)
    }

    pub fn with_pan(mut self, pan: impl Into<String>) -> Self {
        self.pan = Some(SecretString::from(pan.into()));
        self
    }

    pub fn with_security_code(mut self, security_code: impl Into<String>) -> Self {
        self.security_code = Some(SecretString::from(security_code.into()));
        self
    }

    /// Expiry date as `MM/YY`
    pub fn with_expiry_date(mut self, expiry_date: impl Into<String>) -> Self {
        self.expiry_date = Some(SecretString::from(expiry_date.into()));
        self
    }

    pub fn pan(&self) -> Option<&str> {
        exposed(&self.pan)
    }

    pub fn security_code(&self) -> Option<&str> {
        exposed(&self.security_code)
    }

    pub fn expiry_date(&self) -> Option<&str> {
        exposed(&self.expiry_date)
    }
}

fn exposed(value: &Option<SecretString>) -> Option<&str> {
    value
        .as_ref()
        .map(|secret| secret.expose_secret())
        .filter(|value| !value.is_empty())
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("pan", &self.pan.as_ref().map(|_| "[REDACTED]"))
            .field("security_code", &self.security_code.as_ref().map(|_| "[REDACTED]"))
            .field("expiry_date", &self.expiry_date.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
