//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when `BALANCE_API_BASE_URL` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. JSON and TOML are both accepted, by extension
//!
//! ## Environment Variables
//! - `BALANCE_API_BASE_URL`: API host (required for env loading)
//! - `BALANCE_API_PREFIX`: path prefix, `/api` by default
//! - `BALANCE_API_TIMEOUT_MS`: HTTP client timeout
//! - `BALANCE_MAX_RETRIES`: retries after the first attempt
//! - `BALANCE_RETRY_DELAY_MS`: base backoff delay
//! - `BALANCE_CALL_TIMEOUT_MS`: per-attempt deadline
//! - `BALANCE_CACHE_TTL_MS`: default cache lifetime
//! - `BALANCE_NOTIFY_ON_FAILURE`: show failure toasts (true/false)
//! - `BALANCE_LOCALE`: `ar` or `en`
//! - `BALANCE_NOTIFICATIONS_ENABLED`: run the notification poller (true/false)
//! - `BALANCE_NOTIFICATION_POLL_SECS`: poll interval
//! - `BALANCE_LOG_LEVEL`: default tracing filter
//! - `BALANCE_LOG_JSON`: JSON log output (true/false)
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! Probed in order, first in the working directory then next to the
//! executable, each also one and two levels up: `balance.toml`,
//! `balance.json`, `config.toml`, `config.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use balance_domain::{BalanceError, Config, Locale, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["balance.toml", "balance.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `BalanceError::Config` if neither source yields a valid config.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Like [`load`], but falls back to the built-in defaults when nothing is
/// configured. Malformed values are still reported.
///
/// # Errors
/// Returns `BalanceError::Config` for invalid environment values or an
/// unreadable config file.
pub fn load_or_default() -> Result<Config> {
    if std::env::var_os("BALANCE_API_BASE_URL").is_some() {
        return load_from_env();
    }
    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No configuration found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `BALANCE_API_BASE_URL` must be set; every other variable is optional.
///
/// # Errors
/// Returns `BalanceError::Config` if the base URL is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("BALANCE_API_BASE_URL")?;
    if let Ok(prefix) = std::env::var("BALANCE_API_PREFIX") {
        config.api.prefix = prefix;
    }
    config.api.timeout_ms = env_parse("BALANCE_API_TIMEOUT_MS", config.api.timeout_ms)?;

    let call = &mut config.safe_call;
    call.max_retries = env_parse("BALANCE_MAX_RETRIES", call.max_retries)?;
    call.retry_delay_ms = env_parse("BALANCE_RETRY_DELAY_MS", call.retry_delay_ms)?;
    call.timeout_ms = env_parse("BALANCE_CALL_TIMEOUT_MS", call.timeout_ms)?;
    call.cache_ttl_ms = env_parse("BALANCE_CACHE_TTL_MS", call.cache_ttl_ms)?;
    call.notify_on_failure = env_bool("BALANCE_NOTIFY_ON_FAILURE", call.notify_on_failure);
    call.locale = env_parse::<Locale>("BALANCE_LOCALE", call.locale)?;

    let notifications = &mut config.notifications;
    notifications.enabled = env_bool("BALANCE_NOTIFICATIONS_ENABLED", notifications.enabled);
    notifications.poll_interval_secs =
        env_parse("BALANCE_NOTIFICATION_POLL_SECS", notifications.poll_interval_secs)?;

    if let Ok(level) = std::env::var("BALANCE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("BALANCE_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `BalanceError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BalanceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BalanceError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BalanceError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, choosing the format from the file extension
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BalanceError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BalanceError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BalanceError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations, if any
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }
    candidate_paths(&roots).into_iter().find(|path| path.exists())
}

fn candidate_paths(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for root in roots {
        for dir in [root.clone(), root.join(".."), root.join("../..")] {
            candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)));
        }
    }
    candidates
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        BalanceError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable, keeping `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BalanceError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
