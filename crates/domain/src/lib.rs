//! # Balance Domain
//!
//! Business domain types for the Balance dashboard call-safety core.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures (API endpoint, call policy, notifications,
//!   logging)
//! - Notification and pagination DTOs shared with the REST API
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Balance crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
