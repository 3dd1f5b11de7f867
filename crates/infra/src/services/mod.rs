//! Service layer implementations.
//!
//! Services combine the HTTP client with the safe call runner and add the
//! per-feature caching and availability rules on top.

pub mod notification_service;

pub use notification_service::NotificationService;
