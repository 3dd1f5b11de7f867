//! Time abstraction for testability
//!
//! Lets the response cache use real monotonic time in production and a
//! controlled clock in tests, so TTL boundaries can be checked exactly
//! without sleeping.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic time
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed offset, so a test can keep one handle and
/// advance time seen by a cache holding another.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current instant
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += duration;
        }
    }

    /// Advance the mock clock by milliseconds (convenience method)
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed = duration;
        }
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or(Duration::ZERO)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates `MockClock::advance` moves `now` by exactly the given amount.
    ///
    /// Assertions:
    /// - `now` does not move on its own
    /// - clones observe advances made through another handle
    #[test]
    fn test_mock_clock_advance_shared() {
        let clock = MockClock::new();
        let other = clock.clone();
        let t0 = clock.now();

        assert_eq!(clock.now(), t0);

        other.advance_millis(250);
        assert_eq!(clock.now() - t0, Duration::from_millis(250));

        clock.set_elapsed(Duration::from_secs(2));
        assert_eq!(other.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_arc_clock_delegates() {
        let clock = Arc::new(MockClock::new());
        let t0 = clock.now();
        clock.advance(Duration::from_secs(1));
        assert_eq!(Clock::now(&clock) - t0, Duration::from_secs(1));
    }
}
