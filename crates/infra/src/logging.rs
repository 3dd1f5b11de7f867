//! Tracing subscriber setup
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`]. The filter
//! comes from `BALANCE_LOG` when set, else from [`LoggingConfig::level`].

use balance_domain::{BalanceError, LoggingConfig, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides the configured filter
pub const LOG_ENV_VAR: &str = "BALANCE_LOG";

/// Install the global subscriber.
///
/// # Errors
/// Returns `BalanceError::Config` if the filter directives are invalid or a
/// global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry.with(fmt::layer().json().with_target(true).with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed
        .map_err(|e| BalanceError::Config(format!("Failed to install tracing subscriber: {e}")))
}

/// Filter from `BALANCE_LOG`, falling back to the configured level
///
/// # Errors
/// Returns `BalanceError::Config` for unparsable directives.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = std::env::var(LOG_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.clone());

    EnvFilter::try_new(&directives)
        .map_err(|e| BalanceError::Config(format!("Invalid log filter '{directives}': {e}")))
}
