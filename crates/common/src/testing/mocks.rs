//! Recording and scripted doubles

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, Ready};
use parking_lot::Mutex;

use crate::error::{CallError, CallResult, ErrorKind};
use crate::readiness::NotificationSource;
use crate::safe_call::{FailureNotifier, Metadata, Outcome, SuccessStatus};

/// Notifier that keeps every message it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<(ErrorKind, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(ErrorKind, String)> {
        self.calls.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_message(&self) -> Option<String> {
        self.calls.lock().last().map(|(_, message)| message.clone())
    }
}

impl FailureNotifier for RecordingNotifier {
    fn notify(&self, kind: ErrorKind, message: &str) {
        self.calls.lock().push((kind, message.to_string()));
    }
}

/// Operation replaying queued results in order
///
/// Once the script runs out the last result is repeated; an empty script
/// yields `CallError::Other`.
#[derive(Debug, Clone)]
pub struct ScriptedOperation<T> {
    script: Arc<Mutex<VecDeque<CallResult<T>>>>,
    last: Arc<Mutex<Option<CallResult<T>>>>,
    invocations: Arc<AtomicU32>,
}

impl<T: Clone + Send + 'static> ScriptedOperation<T> {
    pub fn new(script: Vec<CallResult<T>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(None)),
            invocations: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Always succeed with `value`
    pub fn succeeding(value: T) -> Self {
        Self::new(vec![Ok(value)])
    }

    /// Always fail with `error`
    pub fn failing(error: CallError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }

    fn next(&self) -> CallResult<T> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock();
        if let Some(result) = self.script.lock().pop_front() {
            *last = Some(result.clone());
            return result;
        }
        last.clone().unwrap_or_else(|| Err(CallError::Other("script exhausted".to_string())))
    }

    /// Closure suitable for [`SafeCallRunner::run`](crate::SafeCallRunner::run)
    pub fn operation(&self) -> impl FnMut() -> Ready<CallResult<T>> + Send + 'static {
        let this = self.clone();
        move || future::ready(this.next())
    }
}

/// Fixed-answer notification source
#[derive(Debug, Clone)]
pub struct StaticSource<T> {
    unread: Arc<Mutex<Result<u64, ErrorKind>>>,
    items: Arc<Mutex<Vec<T>>>,
    count_calls: Arc<AtomicU32>,
    list_calls: Arc<AtomicU32>,
}

impl<T: Clone + Send + Sync + 'static> StaticSource<T> {
    pub fn new(unread: u64, items: Vec<T>) -> Self {
        Self {
            unread: Arc::new(Mutex::new(Ok(unread))),
            items: Arc::new(Mutex::new(items)),
            count_calls: Arc::new(AtomicU32::new(0)),
            list_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn set_unread(&self, unread: u64) {
        *self.unread.lock() = Ok(unread);
    }

    /// Make the unread-count call fail with `kind` until reset
    pub fn fail_with(&self, kind: ErrorKind) {
        *self.unread.lock() = Err(kind);
    }

    pub fn set_items(&self, items: Vec<T>) {
        *self.items.lock() = items;
    }

    pub fn count_calls(&self) -> u32 {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> NotificationSource for StaticSource<T> {
    type Item = T;

    async fn unread_count(&self) -> Outcome<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let result = *self.unread.lock();
        match result {
            Ok(count) => Outcome::success(count, SuccessStatus::Success, Metadata::default()),
            Err(kind) => Outcome::failure(kind, format!("unread count failed: {kind}"), Metadata::default()),
        }
    }

    async fn list(&self) -> Outcome<Vec<T>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items.lock().clone();
        Outcome::success(items, SuccessStatus::Success, Metadata::default())
    }
}
