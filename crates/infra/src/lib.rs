//! # Balance Infrastructure
//!
//! I/O side of the Balance dashboard call-safety core.
//!
//! This crate contains:
//! - Configuration loading (environment variables, TOML/JSON files)
//! - Tracing subscriber initialization
//! - The typed REST client for the Balance API
//! - The notification service, wired to the readiness gate
//!
//! ## Architecture
//! - Builds on the runner, cache and gate from `balance-common`
//! - Depends on `balance-domain` for configuration and DTOs
//! - Contains all "impure" code (network, environment, filesystem)

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod services;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{ApiClient, ApiClientBuilder};
pub use logging::init_tracing;
pub use services::NotificationService;
