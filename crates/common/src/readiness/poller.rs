//! Interval-driven notification poller
//!
//! While the gate is `Checking` each tick probes the backend with the cheap
//! unread-count call. Once `Ready`, ticks keep polling the count and only
//! refresh the full list when the count went up. `NotReady` suspends all
//! traffic until [`NotificationPoller::retry`] is called.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use balance_common::readiness::{NotificationPoller, NotificationSource};
//! use balance_domain::NotificationConfig;
//!
//! # async fn example<S: NotificationSource>(source: Arc<S>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut poller = NotificationPoller::new(source, &NotificationConfig::default());
//! poller.start().await?;
//! // ... dashboard runs ...
//! let snapshot = poller.snapshot();
//! println!("{} unread", snapshot.unread_count);
//! poller.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use balance_domain::NotificationConfig;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::gate::{GateEvent, GateHandle, GateState, ReadinessGate, TickAction};
use crate::error::ErrorKind;
use crate::safe_call::Outcome;

/// Remote side of the notifications feature
#[async_trait]
pub trait NotificationSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Cheap call used both as the probe and as the periodic poll
    async fn unread_count(&self) -> Outcome<u64>;

    /// Full listing, fetched only when something new arrived
    async fn list(&self) -> Outcome<Vec<Self::Item>>;
}

/// Poller lifecycle errors
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("Poller already running")]
    AlreadyRunning,

    #[error("Poller not running")]
    NotRunning,

    #[error("Poller did not stop within {0:?}")]
    Timeout(Duration),

    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<tokio::task::JoinError> for PollerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoinFailed(err.to_string())
    }
}

pub type PollerResult<T> = Result<T, PollerError>;

/// What the UI layer reads after each tick
#[derive(Debug, Clone, PartialEq)]
pub struct PollerSnapshot<T> {
    pub state: GateState,
    pub unread_count: u64,
    pub items: Vec<T>,
    /// Last user-facing failure message; `None` when the backend is simply
    /// missing the feature
    pub last_error: Option<String>,
}

impl<T> Default for PollerSnapshot<T> {
    fn default() -> Self {
        Self { state: GateState::Checking, unread_count: 0, items: Vec::new(), last_error: None }
    }
}

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared pieces the background loop needs
struct PollContext<S: NotificationSource> {
    source: Arc<S>,
    gate: GateHandle,
    snapshot: Arc<RwLock<PollerSnapshot<S::Item>>>,
}

impl<S: NotificationSource> Clone for PollContext<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            gate: self.gate.clone(),
            snapshot: Arc::clone(&self.snapshot),
        }
    }
}

impl<S: NotificationSource> PollContext<S> {
    async fn tick(&self) -> TickAction {
        let action = self.gate.tick();
        match action {
            TickAction::Skip => debug!("Notification polling suspended"),
            TickAction::Probe => self.probe().await,
            TickAction::Poll => self.poll().await,
        }
        self.snapshot.write().state = self.gate.state();
        action
    }

    async fn probe(&self) {
        match self.source.unread_count().await {
            Outcome::Success { value, .. } => {
                self.gate.apply(GateEvent::ProbeSucceeded);
                self.snapshot.write().unread_count = value;
                self.refresh_list().await;
            }
            Outcome::Failure { kind, message, .. } => {
                let state = self.gate.apply(GateEvent::ProbeFailed(kind));
                self.record_failure(state, kind, message);
            }
        }
    }

    async fn poll(&self) {
        match self.source.unread_count().await {
            Outcome::Success { value, .. } => {
                self.gate.apply(GateEvent::PollSucceeded);
                let previous = {
                    let mut snapshot = self.snapshot.write();
                    std::mem::replace(&mut snapshot.unread_count, value)
                };
                if value > previous {
                    debug!(previous, current = value, "Unread count increased, refreshing list");
                    self.refresh_list().await;
                }
            }
            Outcome::Failure { kind, message, .. } => {
                let state = self.gate.apply(GateEvent::PollFailed(kind));
                self.record_failure(state, kind, message);
            }
        }
    }

    async fn refresh_list(&self) {
        match self.source.list().await {
            Outcome::Success { value, .. } => {
                let mut snapshot = self.snapshot.write();
                snapshot.items = value;
                snapshot.last_error = None;
            }
            Outcome::Failure { kind, message, .. } => {
                warn!(%kind, "Notification list refresh failed");
                self.snapshot.write().last_error = Some(message);
            }
        }
    }

    fn record_failure(&self, state: GateState, kind: ErrorKind, message: String) {
        let mut snapshot = self.snapshot.write();
        if state == GateState::NotReady {
            snapshot.unread_count = 0;
            snapshot.items.clear();
        }
        // A missing feature is reported as empty data, not as an error
        snapshot.last_error = match kind {
            ErrorKind::NotFound | ErrorKind::Unknown | ErrorKind::Cancelled => None,
            _ => Some(message),
        };
    }
}

/// Background driver for a [`ReadinessGate`]
///
/// Readiness checks run on the poll cadence, not a faster one: a transient
/// outage reaches `NotReady` only after `max_probe_attempts` intervals
/// (about six minutes at the 120 s default). [`Self::retry`] checks
/// immediately.
pub struct NotificationPoller<S: NotificationSource> {
    context: PollContext<S>,
    interval: Duration,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl<S: NotificationSource> NotificationPoller<S> {
    pub fn new(source: Arc<S>, config: &NotificationConfig) -> Self {
        let gate = GateHandle::new(ReadinessGate::new(config.max_probe_attempts));
        Self::with_gate(source, gate, config.poll_interval())
    }

    /// Drive an existing gate, e.g. one also handed to request paths
    pub fn with_gate(source: Arc<S>, gate: GateHandle, interval: Duration) -> Self {
        Self {
            context: PollContext {
                source,
                gate,
                snapshot: Arc::new(RwLock::new(PollerSnapshot::default())),
            },
            interval,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn gate(&self) -> GateHandle {
        self.context.gate.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn snapshot(&self) -> PollerSnapshot<S::Item> {
        self.context.snapshot.read().clone()
    }

    /// Run one tick on the caller's task
    pub async fn poll_once(&self) -> TickAction {
        self.context.tick().await
    }

    /// Reset the gate to `Checking` and probe right away
    #[instrument(skip(self))]
    pub async fn retry(&self) -> TickAction {
        info!("Notification readiness retry requested");
        self.context.gate.reset();
        self.context.snapshot.write().last_error = None;
        self.poll_once().await
    }

    /// Spawn the polling loop; the first tick runs immediately
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::AlreadyRunning`] if a loop is active
    #[instrument(skip(self), fields(interval = ?self.interval))]
    pub async fn start(&mut self) -> PollerResult<()> {
        if self.is_running() {
            return Err(PollerError::AlreadyRunning);
        }

        // Fresh token so the poller can be restarted after stop
        self.cancellation_token = CancellationToken::new();

        let context = self.context.clone();
        let interval = self.interval;
        let cancel = self.cancellation_token.clone();
        let handle = tokio::spawn(async move {
            Self::poll_loop(context, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        info!("Notification poller started");
        Ok(())
    }

    /// Cancel the loop, dropping any in-flight call, and wait for it to end
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::NotRunning`] if no loop is active
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> PollerResult<()> {
        if !self.is_running() {
            return Err(PollerError::NotRunning);
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            tokio::time::timeout(STOP_TIMEOUT, handle)
                .await
                .map_err(|_| PollerError::Timeout(STOP_TIMEOUT))??;
        }

        info!("Notification poller stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn poll_loop(context: PollContext<S>, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = context.tick() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }
        debug!("Notification poll loop cancelled");
    }
}

impl<S: NotificationSource> Drop for NotificationPoller<S> {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
