//! Backend-readiness gate and the notification poller that drives it

mod gate;
mod poller;

pub use gate::{GateEvent, GateHandle, GateState, ReadinessGate, TickAction};
pub use poller::{NotificationPoller, NotificationSource, PollerError, PollerResult, PollerSnapshot};
