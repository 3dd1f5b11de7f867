//! Test doubles for code built on the runner and the poller
//!
//! - **[`RecordingNotifier`]**: captures user-facing failure messages
//! - **[`ScriptedOperation`]**: replays a fixed sequence of call results and
//!   counts invocations
//! - **[`StaticSource`]**: in-memory [`NotificationSource`](crate::readiness::NotificationSource)
//! - **[`poll_until`]**: waits for a condition under paused or real time
//!
//! ```rust
//! use balance_common::testing::{RecordingNotifier, ScriptedOperation};
//! use balance_common::{CallError, CallOptions, ResponseCache, SafeCallRunner};
//!
//! # tokio_test::block_on(async {
//! let notifier = RecordingNotifier::new();
//! let runner = SafeCallRunner::new(ResponseCache::new()).with_notifier(notifier.clone());
//! let op = ScriptedOperation::<String>::new(vec![Err(CallError::http(404, "missing"))]);
//!
//! let outcome = runner.run(op.operation(), "failed", CallOptions::new()).await;
//! assert!(outcome.is_failure());
//! assert_eq!(op.invocations(), 1);
//! assert_eq!(notifier.count(), 1);
//! # });
//! ```

mod async_utils;
mod mocks;

pub use async_utils::poll_until;
pub use mocks::{RecordingNotifier, ScriptedOperation, StaticSource};
