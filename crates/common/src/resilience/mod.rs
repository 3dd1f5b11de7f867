//! Resilience building blocks for wrapped calls
//!
//! - **Retry policy**: attempt budget, per-attempt timeout and backoff
//!   schedule, deciding from an [`ErrorKind`](crate::error::ErrorKind)
//!   whether another attempt is made
//! - **Clock**: monotonic time source with a mock for TTL tests

pub mod clock;
pub mod retry;

pub use clock::{Clock, MockClock, SystemClock};
pub use retry::{BackoffStrategy, PolicyError, RetryDecision, RetryPolicy, RetryPolicyBuilder};
