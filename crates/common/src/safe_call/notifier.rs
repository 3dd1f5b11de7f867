//! User-facing failure notification sink

use tracing::warn;

use crate::error::ErrorKind;

/// Receives the localized message of every call that ends in failure with
/// notification enabled. The dashboard shows these as toasts.
pub trait FailureNotifier: Send + Sync {
    fn notify(&self, kind: ErrorKind, message: &str);
}

/// Default sink: emits a `warn!` event on the `balance::notify` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl FailureNotifier for TracingNotifier {
    fn notify(&self, kind: ErrorKind, message: &str) {
        warn!(target: "balance::notify", kind = %kind, message, "User-facing call failure");
    }
}

impl<F> FailureNotifier for F
where
    F: Fn(ErrorKind, &str) + Send + Sync,
{
    fn notify(&self, kind: ErrorKind, message: &str) {
        self(kind, message);
    }
}
