//! Configuration loading
//!
//! Resolves the dashboard [`Config`](balance_domain::Config) from `BALANCE_*`
//! environment variables or a config file.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, load_or_default, probe_config_paths};
