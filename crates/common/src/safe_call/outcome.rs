//! Uniform result of a wrapped call

use std::time::Duration;

use crate::error::ErrorKind;

/// Whether a successful call returned meaningful data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessStatus {
    Success,
    Empty,
}

/// Call bookkeeping attached to every outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Wall time from entering the runner to producing the outcome
    pub elapsed: Duration,
    /// Attempts made after the first one
    pub retry_count: u32,
    pub served_from_cache: bool,
}

/// Result of a wrapped call: a value or a classified failure, never both
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success {
        value: T,
        status: SuccessStatus,
        metadata: Metadata,
        /// Advisory for the UI, e.g. a very large listing
        warning: Option<String>,
    },
    Failure {
        kind: ErrorKind,
        /// Localized text suitable for display
        message: String,
        metadata: Metadata,
    },
}

impl<T> Outcome<T> {
    pub fn success(value: T, status: SuccessStatus, metadata: Metadata) -> Self {
        Self::Success { value, status, metadata, warning: None }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>, metadata: Metadata) -> Self {
        Self::Failure { kind, message: message.into(), metadata }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// True for a success whose value was classified empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Success { status: SuccessStatus::Empty, .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure { .. } => None,
        }
    }

    pub fn status(&self) -> Option<SuccessStatus> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure { .. } => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            Self::Success { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Failure { message, .. } => Some(message),
            Self::Success { .. } => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Success { warning, .. } => warning.as_deref(),
            Self::Failure { .. } => None,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Success { metadata, .. } | Self::Failure { metadata, .. } => metadata,
        }
    }

    pub fn with_warning(self, advisory: Option<String>) -> Self {
        match self {
            Self::Success { value, status, metadata, .. } => {
                Self::Success { value, status, metadata, warning: advisory }
            }
            failure => failure,
        }
    }

    /// Transform the success value, keeping status and metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success { value, status, metadata, warning } => {
                Outcome::Success { value: f(value), status, metadata, warning }
            }
            Self::Failure { kind, message, metadata } => Outcome::Failure { kind, message, metadata },
        }
    }

    /// Value on success, the localized message on failure
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Failure { message, .. } => Err(message),
        }
    }
}
