//! Conversions from external infrastructure errors into workspace errors.

use std::time::Duration;

use balance_common::CallError;
use balance_domain::BalanceError;
use reqwest::Error as HttpError;
use thiserror::Error;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(pub BalanceError);

impl From<InfraError> for BalanceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BalanceError> for InfraError {
    fn from(value: BalanceError) -> Self {
        InfraError(value)
    }
}

/// Classify a transport failure for the call runner.
///
/// `timeout` is the client deadline, reported back on `CallError::Timeout`.
pub(crate) trait IntoCallError {
    fn into_call_error(self, timeout: Duration) -> CallError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CallError */
/* -------------------------------------------------------------------------- */

impl IntoCallError for HttpError {
    fn into_call_error(self, timeout: Duration) -> CallError {
        if self.is_timeout() {
            return CallError::Timeout(timeout);
        }

        if self.is_connect() {
            return CallError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_decode() {
            return CallError::Decode(self.to_string());
        }

        if let Some(status) = self.status() {
            let detail = status.canonical_reason().unwrap_or("unknown status").to_string();
            return CallError::Http { status: status.as_u16(), detail };
        }

        CallError::Network(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BalanceError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let err = if value.is_builder() {
            BalanceError::Config(format!("Invalid HTTP client setup: {value}"))
        } else {
            BalanceError::Network(value.to_string())
        };
        InfraError(err)
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
