//! Backend-readiness state machine
//!
//! Decides whether the notifications feature should be polled. The backend
//! may not have the feature deployed at all, in which case the dashboard
//! must stay quiet instead of hammering a missing endpoint.
//!
//! ```text
//!            ProbeSucceeded                 PollFailed
//! Checking ─────────────────▶ Ready ─────────────────────▶ NotReady
//!    │  ProbeFailed(not-found | unknown)                       ▲
//!    ├─────────────────────────────────────────────────────────┤
//!    │  ProbeFailed(other) x max_probe_attempts                │
//!    └─────────────────────────────────────────────────────────┘
//!                     RetryRequested (any state) ──▶ Checking
//! ```

use std::sync::Arc;

use balance_domain::constants::DEFAULT_MAX_PROBE_ATTEMPTS;
use balance_domain::impl_wire_label_conversions;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ErrorKind;

/// Readiness of the backend feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Checking,
    Ready,
    NotReady,
}

impl_wire_label_conversions!(GateState {
    Checking => "checking",
    Ready => "ready",
    NotReady => "not_ready",
});

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    ProbeSucceeded,
    ProbeFailed(ErrorKind),
    PollSucceeded,
    PollFailed(ErrorKind),
    RetryRequested,
    Tick,
}

/// What the driver should do on a timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Initial probe while `Checking`
    Probe,
    /// Cheap poll while `Ready`
    Poll,
    /// Suspended while `NotReady`
    Skip,
}

/// The readiness state machine itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessGate {
    state: GateState,
    probe_failures: u32,
    max_probe_attempts: u32,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROBE_ATTEMPTS)
    }
}

impl ReadinessGate {
    pub fn new(max_probe_attempts: u32) -> Self {
        Self { state: GateState::Checking, probe_failures: 0, max_probe_attempts: max_probe_attempts.max(1) }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Consecutive failed probes in the current `Checking` phase
    pub fn probe_failures(&self) -> u32 {
        self.probe_failures
    }

    /// Apply `event` and return the resulting state.
    ///
    /// Events that do not belong to the current state are ignored, as are
    /// failures of kind `cancelled` (the driver shut down mid-call).
    pub fn apply(&mut self, event: GateEvent) -> GateState {
        let next = match (self.state, event) {
            (_, GateEvent::RetryRequested) => {
                self.probe_failures = 0;
                GateState::Checking
            }
            (_, GateEvent::ProbeFailed(ErrorKind::Cancelled))
            | (_, GateEvent::PollFailed(ErrorKind::Cancelled))
            | (_, GateEvent::Tick) => self.state,

            (GateState::Checking, GateEvent::ProbeSucceeded) => {
                self.probe_failures = 0;
                GateState::Ready
            }
            (GateState::Checking, GateEvent::ProbeFailed(ErrorKind::NotFound | ErrorKind::Unknown)) => {
                GateState::NotReady
            }
            (GateState::Checking, GateEvent::ProbeFailed(_)) => {
                self.probe_failures += 1;
                if self.probe_failures >= self.max_probe_attempts {
                    GateState::NotReady
                } else {
                    GateState::Checking
                }
            }

            (GateState::Ready, GateEvent::PollFailed(_)) => GateState::NotReady,
            (GateState::Ready, GateEvent::PollSucceeded) => GateState::Ready,

            (state, ignored) => {
                debug!(?state, ?ignored, "Ignoring event for current readiness state");
                state
            }
        };

        if next != self.state {
            info!(from = %self.state, to = %next, ?event, "Readiness state changed");
            self.state = next;
        }
        next
    }

    /// Action for the current state
    pub fn next_action(&self) -> TickAction {
        match self.state {
            GateState::Checking => TickAction::Probe,
            GateState::Ready => TickAction::Poll,
            GateState::NotReady => TickAction::Skip,
        }
    }

    /// Apply a `Tick` and return what the driver should do
    pub fn tick(&mut self) -> TickAction {
        self.apply(GateEvent::Tick);
        self.next_action()
    }
}

/// Shared handle to one gate, read by request paths and driven by the poller
#[derive(Debug, Clone, Default)]
pub struct GateHandle {
    inner: Arc<Mutex<ReadinessGate>>,
}

impl GateHandle {
    pub fn new(gate: ReadinessGate) -> Self {
        Self { inner: Arc::new(Mutex::new(gate)) }
    }

    pub fn state(&self) -> GateState {
        self.inner.lock().state()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == GateState::Ready
    }

    pub fn apply(&self, event: GateEvent) -> GateState {
        self.inner.lock().apply(event)
    }

    pub fn tick(&self) -> TickAction {
        self.inner.lock().tick()
    }

    /// Back to `Checking` with counters reset
    pub fn reset(&self) -> GateState {
        self.apply(GateEvent::RetryRequested)
    }
}
