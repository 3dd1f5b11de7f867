//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the Balance workspace
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BalanceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Balance operations
pub type Result<T> = std::result::Result<T, BalanceError>;

impl From<std::io::Error> for BalanceError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("I/O failure: {err}"))
    }
}

impl From<serde_json::Error> for BalanceError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("Invalid JSON: {err}"))
    }
}
