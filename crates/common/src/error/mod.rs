//! Error taxonomy for wrapped remote calls
//!
//! Every failure an operation can produce is a [`CallError`]. The runner
//! never inspects the error beyond [`CallError::kind`], which collapses it
//! into one of nine [`ErrorKind`]s. The kind decides two things:
//!
//! 1. **Retry**: only `network-error`, `timeout` and `http-5xx` are transient.
//! 2. **User message**: each kind except `unknown` has a fixed localized
//!    message (see [`messages`]); `unknown` falls back to the caller's text.
//!
//! ## ErrorClassification Trait
//!
//! `CallError` implements [`ErrorClassification`] so retry and alerting code
//! elsewhere in the workspace can treat it like any other classified error:
//!
//! - **`is_retryable()`**: transient kinds only
//! - **`severity()`**: Info/Warning/Error/Critical
//! - **`is_critical()`**: never, a remote call cannot corrupt local state
//! - **`retry_after()`**: no server hint is honoured
//!
//! ## Status Mapping
//!
//! | Status | Kind |
//! |--------|------|
//! | 400, 422 | `validation` |
//! | 401 | `unauthorized` |
//! | 403 | `forbidden` |
//! | 404 | `not-found` |
//! | 500..=599 | `http-5xx` |
//! | other | `unknown` |

pub mod messages;

use std::fmt;
use std::time::Duration;

use balance_domain::{impl_wire_label_conversions, BalanceError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use messages::user_message;

/// Classification of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "network-error")]
    Network,
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "unauthorized")]
    Unauthorized,
    #[serde(rename = "forbidden")]
    Forbidden,
    #[serde(rename = "not-found")]
    NotFound,
    #[serde(rename = "validation")]
    Validation,
    #[serde(rename = "http-5xx")]
    Server,
    #[serde(rename = "unknown")]
    Unknown,
}

impl_wire_label_conversions!(ErrorKind {
    Network => "network-error",
    Timeout => "timeout",
    Cancelled => "cancelled",
    Unauthorized => "unauthorized",
    Forbidden => "forbidden",
    NotFound => "not-found",
    Validation => "validation",
    Server => "http-5xx",
    Unknown => "unknown",
});

impl ErrorKind {
    /// Classify an HTTP status code (only meaningful for status >= 400)
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }

    /// Whether another attempt may succeed
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Server)
    }
}

/// Failure returned by a wrapped operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// Transport failure before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// The attempt exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller aborted the request
    #[error("Request was cancelled")]
    Cancelled,

    /// The server answered with an error status
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for wrapped operations
pub type CallResult<T> = Result<T, CallError>;

impl CallError {
    pub fn http(status: u16, detail: impl Into<String>) -> Self {
        Self::Http { status, detail: detail.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Http { status, .. } => ErrorKind::from_status(*status),
            Self::Decode(_) | Self::Other(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<BalanceError> for CallError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::Network(msg) => Self::Network(msg),
            BalanceError::Auth(msg) => Self::Http { status: 401, detail: msg },
            BalanceError::NotFound(msg) => Self::Http { status: 404, detail: msg },
            other => Self::Other(other.to_string()),
        }
    }
}

/// Trait for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for monitoring, alerting, and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl ErrorClassification for CallError {
    fn is_retryable(&self) -> bool {
        self.kind().is_transient()
    }

    fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Cancelled | ErrorKind::NotFound => ErrorSeverity::Info,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server => ErrorSeverity::Warning,
            ErrorKind::Unauthorized
            | ErrorKind::Forbidden
            | ErrorKind::Validation
            | ErrorKind::Unknown => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates `ErrorKind::from_status` for every documented status class.
    ///
    /// Assertions:
    /// - 400/422 map to validation, 401/403/404 to their own kinds
    /// - every 5xx maps to `Server`
    /// - unlisted 4xx codes map to `Unknown`
    #[test]
    fn test_kind_from_status() {
        assert_eq!(ErrorKind::from_status(400), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Forbidden);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(409), ErrorKind::Unknown);
        assert_eq!(ErrorKind::from_status(429), ErrorKind::Unknown);
    }

    #[test]
    fn test_transient_kinds() {
        let transient: Vec<_> = [
            ErrorKind::Network,
            ErrorKind::Timeout,
            ErrorKind::Cancelled,
            ErrorKind::Unauthorized,
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::Validation,
            ErrorKind::Server,
            ErrorKind::Unknown,
        ]
        .into_iter()
        .filter(|k| k.is_transient())
        .collect();

        assert_eq!(transient, vec![ErrorKind::Network, ErrorKind::Timeout, ErrorKind::Server]);
    }

    /// Validates the wire labels are shared by `Display` and serde.
    #[test]
    fn test_labels_match_serde() {
        for kind in [ErrorKind::Network, ErrorKind::NotFound, ErrorKind::Server] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
        assert_eq!("http-5xx".parse::<ErrorKind>().unwrap(), ErrorKind::Server);
    }

    #[test]
    fn test_call_error_classification() {
        let err = CallError::http(502, "bad gateway");
        assert_eq!(err.kind(), ErrorKind::Server);
        assert!(err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.status(), Some(502));

        let err = CallError::Decode("expected value".into());
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(!err.is_retryable());
        assert!(!err.is_critical());
    }

    #[test]
    fn test_from_domain_error() {
        let err: CallError = BalanceError::NotFound("notification 7".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: CallError = BalanceError::Config("bad url".into()).into();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }
}
