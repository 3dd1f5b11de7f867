//! Configuration structures
//!
//! Sections map one-to-one onto the TOML/JSON config file and the
//! `BALANCE_*` environment variables read by the infra loader. Every section
//! carries the dashboard defaults, so a partial file is accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_PREFIX, DEFAULT_API_TIMEOUT_MS, DEFAULT_CACHE_TTL_MS,
    DEFAULT_CALL_TIMEOUT_MS, DEFAULT_MAX_PROBE_ATTEMPTS, DEFAULT_MAX_RETRIES,
    DEFAULT_NOTIFICATION_POLL_SECS, DEFAULT_PAGE_SIZE, DEFAULT_RETRY_DELAY_MS,
};
use crate::types::Locale;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub safe_call: SafeCallConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

/// Remote REST API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub prefix: String,
    pub timeout_ms: u64,
    pub default_page_size: u32,
}

impl ApiConfig {
    /// Base URL joined with the API prefix, without a trailing slash.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.prefix.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            prefix: DEFAULT_API_PREFIX.to_string(),
            timeout_ms: DEFAULT_API_TIMEOUT_MS,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Default policy applied by the safe call runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeCallConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_ms: u64,
    pub cache_ttl_ms: u64,
    pub notify_on_failure: bool,
    pub locale: Locale,
}

impl SafeCallConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

impl Default for SafeCallConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            notify_on_failure: true,
            locale: Locale::default(),
        }
    }
}

/// Notification polling behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub max_probe_attempts: u32,
}

impl NotificationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: DEFAULT_NOTIFICATION_POLL_SECS,
            max_probe_attempts: DEFAULT_MAX_PROBE_ATTEMPTS,
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `BALANCE_LOG`
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
