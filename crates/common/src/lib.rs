//! Call-safety primitives shared across Balance crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error taxonomy, localized failure messages, clock
//! - `runtime`: safe call runner, response cache, readiness gate and poller
//! - `test-utils`: recording notifier and scripted operations for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod resilience;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod readiness;
#[cfg(feature = "runtime")]
pub mod safe_call;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use cache::{CacheStats, ResponseCache};
#[cfg(feature = "foundation")]
pub use error::{CallError, CallResult, ErrorClassification, ErrorKind, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use readiness::{
    GateEvent, GateState, NotificationPoller, NotificationSource, PollerError, PollerSnapshot,
    ReadinessGate, TickAction,
};
#[cfg(feature = "foundation")]
pub use resilience::{
    BackoffStrategy, Clock, MockClock, RetryDecision, RetryPolicy, RetryPolicyBuilder,
    SystemClock,
};
#[cfg(feature = "runtime")]
pub use safe_call::{
    CacheOptions, CallOptions, EmptyCheck, FailureNotifier, Metadata, NamedOperation, Outcome,
    Page, PageResult, PaginationOptions, SafeCallRunner, SuccessStatus, TracingNotifier,
};
