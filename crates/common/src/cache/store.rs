//! Keyed TTL store with an oldest-first sweep

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use balance_domain::constants::{
    CACHE_ENTRY_CEILING, CACHE_SWEEP_DENOMINATOR, CACHE_SWEEP_NUMERATOR,
};
use parking_lot::RwLock;
use tracing::debug;

use super::stats::{CacheStats, MetricsCollector};
use crate::resilience::{Clock, SystemClock};

/// Entry stored in the cache, replaced whole on every write
#[derive(Clone)]
struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
}

/// Thread-safe, cloneable handle to one shared response store
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    metrics: MetricsCollector,
    clock: Arc<dyn Clock>,
    ceiling: usize,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("len", &self.len())
            .field("ceiling", &self.ceiling)
            .finish()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    /// Create an empty cache on the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create an empty cache on a custom clock (useful for testing)
    pub fn with_clock(clock: impl Clock) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            metrics: MetricsCollector::default(),
            clock: Arc::new(clock),
            ceiling: CACHE_ENTRY_CEILING,
        }
    }

    /// Override the entry count above which the sweep runs
    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Value stored under `key` if it is younger than `ttl` and of type `T`.
    ///
    /// Expired entries stay in place; only the sweep or [`clear`] removes
    /// them.
    ///
    /// [`clear`]: ResponseCache::clear
    pub fn get<T>(&self, key: &str, ttl: Duration) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = self.clock.now();
        let found = {
            let entries = self.entries.read();
            entries
                .get(key)
                .filter(|entry| now.saturating_duration_since(entry.stored_at) < ttl)
                .and_then(|entry| entry.value.downcast_ref::<T>().cloned())
        };

        if found.is_some() {
            self.metrics.record_hit();
        } else {
            self.metrics.record_miss();
        }
        found
    }

    /// Insert or overwrite `key`, then sweep if the store is over its ceiling
    pub fn set<T>(&self, key: impl Into<String>, value: T)
    where
        T: Send + Sync + 'static,
    {
        let entry = CacheEntry { value: Arc::new(value), stored_at: self.clock.now() };

        let mut entries = self.entries.write();
        entries.insert(key.into(), entry);
        self.metrics.record_insert();

        if entries.len() > self.ceiling {
            let removed = sweep_oldest(&mut entries);
            self.metrics.record_evictions(removed as u64);
            debug!(removed, remaining = entries.len(), "Response cache swept");
        }
    }

    /// Remove a single entry, returning whether it existed
    pub fn remove(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`
    pub fn remove_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Remove all entries and reset counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.metrics.reset();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        self.metrics.snapshot(keys)
    }
}

/// Drop the oldest `floor(len / 4)` entries by `stored_at`
fn sweep_oldest(entries: &mut HashMap<String, CacheEntry>) -> usize {
    let count = entries.len() * CACHE_SWEEP_NUMERATOR / CACHE_SWEEP_DENOMINATOR;

    let mut by_age: Vec<(Instant, String)> =
        entries.iter().map(|(key, entry)| (entry.stored_at, key.clone())).collect();
    by_age.sort();

    for (_, key) in by_age.into_iter().take(count) {
        entries.remove(&key);
    }
    count
}
