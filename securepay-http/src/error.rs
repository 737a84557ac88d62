//! Gateway client error types.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for gateway client operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway client errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request body or client could not be built.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The whole exchange, retries included, exceeded the request ceiling.
    #[error("Request did not complete within {0:?}")]
    Timeout(Duration),

    /// The gateway answered outside 2xx.
    #[error("Unacceptable status code: {0}")]
    UnacceptableStatusCode(u16),

    /// The gateway answered with an empty body.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// The body or the token inside it could not be decoded.
    #[error("Failed to parse response: {0}")]
    ResponseParse(String),

    /// Certificate pin mismatch or TLS configuration failure.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl GatewayError {
    /// Stable numeric code reported to merchants.
    pub fn code(&self) -> i32 {
        match self {
            Self::RequestBuild(_) | Self::InvalidUrl(_) => 10000,
            Self::Transport(_) | Self::Timeout(_) | Self::Tls(_) => 11000,
            Self::MissingData(_) => 12200,
            Self::UnacceptableStatusCode(_) => 12400,
            Self::ResponseParse(_) => 13000,
        }
    }

    /// Check if this error is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
            || matches!(self, Self::Transport(e) if e.kind == TransportErrorKind::TimedOut)
    }

    /// Get the HTTP status code if the gateway answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnacceptableStatusCode(status) => Some(*status),
            _ => None,
        }
    }
}

/// Network-level failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    TimedOut,
    CannotFindHost,
    CannotConnectToHost,
    NetworkConnectionLost,
    DnsLookupFailed,
    Other,
}

impl TransportErrorKind {
    fn from_io(kind: io::ErrorKind) -> Option<Self> {
        match kind {
            io::ErrorKind::TimedOut => Some(Self::TimedOut),
            io::ErrorKind::ConnectionRefused => Some(Self::CannotConnectToHost),
            io::ErrorKind::AddrNotAvailable => Some(Self::CannotFindHost),
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => Some(Self::NetworkConnectionLost),
            _ => None,
        }
    }

    fn from_message(message: &str) -> Option<Self> {
        let message = message.to_ascii_lowercase();
        if message.contains("failed to lookup address") {
            Some(Self::CannotFindHost)
        } else if message.contains("dns error") {
            Some(Self::DnsLookupFailed)
        } else {
            None
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TimedOut => "timed out",
            Self::CannotFindHost => "cannot find host",
            Self::CannotConnectToHost => "cannot connect to host",
            Self::NetworkConnectionLost => "network connection lost",
            Self::DnsLookupFailed => "DNS lookup failed",
            Self::Other => "network failure",
        };
        f.write_str(name)
    }
}

/// A request that failed before any HTTP response arrived.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transient network conditions are retried; anything else is final.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, TransportErrorKind::Other)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return TransportError::new(TransportErrorKind::TimedOut, error.to_string()).into();
        }

        let mut source = StdError::source(&error);
        while let Some(cause) = source {
            if let Some(tls) = cause.downcast_ref::<rustls::Error>() {
                return GatewayError::Tls(tls.to_string());
            }
            if let Some(io_error) = cause.downcast_ref::<io::Error>() {
                // rustls failures surface wrapped in an io::Error
                if let Some(tls) = io_error
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<rustls::Error>())
                {
                    return GatewayError::Tls(tls.to_string());
                }
                if let Some(kind) = TransportErrorKind::from_io(io_error.kind()) {
                    return TransportError::new(kind, error.to_string()).into();
                }
            }
            if let Some(kind) = TransportErrorKind::from_message(&cause.to_string()) {
                return TransportError::new(kind, error.to_string()).into();
            }
            source = cause.source();
        }

        let kind = if error.is_connect() {
            TransportErrorKind::CannotConnectToHost
        } else {
            TransportErrorKind::Other
        };
        TransportError::new(kind, error.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        for kind in [
            TransportErrorKind::TimedOut,
            TransportErrorKind::CannotFindHost,
            TransportErrorKind::CannotConnectToHost,
            TransportErrorKind::NetworkConnectionLost,
            TransportErrorKind::DnsLookupFailed,
        ] {
            let error = GatewayError::from(TransportError::new(kind, "boom"));
            assert!(error.is_retryable(), "{:?}", kind);
            assert_eq!(error.code(), 11000);
        }

        let other = GatewayError::from(TransportError::new(TransportErrorKind::Other, "boom"));
        assert!(!other.is_retryable());
    }

    #[test]
    fn test_non_transport_errors_are_final() {
        assert!(!GatewayError::UnacceptableStatusCode(503).is_retryable());
        assert!(!GatewayError::Tls("pin mismatch".into()).is_retryable());
        assert!(!GatewayError::Timeout(Duration::from_secs(60)).is_retryable());
        assert!(GatewayError::Timeout(Duration::from_secs(60)).is_timeout());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GatewayError::RequestBuild("x".into()).code(), 10000);
        assert_eq!(GatewayError::MissingData("x".into()).code(), 12200);
        assert_eq!(GatewayError::UnacceptableStatusCode(404).code(), 12400);
        assert_eq!(GatewayError::ResponseParse("x".into()).code(), 13000);
        assert_eq!(GatewayError::UnacceptableStatusCode(404).status_code(), Some(404));
    }

    #[test]
    fn test_io_kind_classification() {
        assert_eq!(
            TransportErrorKind::from_io(io::ErrorKind::ConnectionRefused),
            Some(TransportErrorKind::CannotConnectToHost)
        );
        assert_eq!(
            TransportErrorKind::from_io(io::ErrorKind::ConnectionReset),
            Some(TransportErrorKind::NetworkConnectionLost)
        );
        assert_eq!(TransportErrorKind::from_io(io::ErrorKind::PermissionDenied), None);
        assert_eq!(
            TransportErrorKind::from_message("dns error: no record found"),
            Some(TransportErrorKind::DnsLookupFailed)
        );
    }
}
