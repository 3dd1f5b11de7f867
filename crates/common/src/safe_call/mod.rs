//! Safe call wrapper for remote operations
//!
//! [`SafeCallRunner`] turns any `FnMut() -> impl Future<Output =
//! CallResult<T>>` into a uniform [`Outcome`]. It owns no transport: the
//! operation does the I/O, the runner supplies the policy around it.
//!
//! - [`SafeCallRunner::run`]: single call with timeout, retry, cache, cancel
//! - [`SafeCallRunner::run_batch`]: isolated concurrent calls
//! - [`SafeCallRunner::run_paginated`]: probe-first listing load

mod empty;
mod notifier;
mod options;
mod outcome;
mod pagination;
mod runner;

pub use empty::EmptyCheck;
pub use notifier::{FailureNotifier, TracingNotifier};
pub use options::{CacheOptions, CallOptions, PaginationOptions};
pub use outcome::{Metadata, Outcome, SuccessStatus};
pub use pagination::{Page, PageResult};
pub use runner::{BoxedOperation, NamedOperation, SafeCallRunner};
