//! REST client for the Balance API

pub mod client;

pub use client::{ApiClient, ApiClientBuilder};
