//! Process-wide response cache
//!
//! [`ResponseCache`] stores the successful results of wrapped calls under
//! caller-supplied string keys. It is a cloneable handle: construct one per
//! process (or per test) and pass clones to every runner that should share
//! it.
//!
//! # Features
//!
//! - **Type-erased**: one store holds values of any `Clone + Send + Sync` type;
//!   a lookup with the wrong type is a miss
//! - **Caller-chosen TTL**: freshness is decided at read time, so the same
//!   entry can serve callers with different tolerances
//! - **Bounded**: once more than 100 entries are held, the oldest quarter is
//!   swept on insert
//! - **Testable**: clock abstraction for exact TTL boundaries
//!
//! # Example
//! ```
//! use std::time::Duration;
//!
//! use balance_common::cache::ResponseCache;
//!
//! let cache = ResponseCache::new();
//! cache.set("projects:list", vec![1, 2, 3]);
//!
//! let hit: Option<Vec<i32>> = cache.get("projects:list", Duration::from_secs(60));
//! assert_eq!(hit, Some(vec![1, 2, 3]));
//! assert_eq!(cache.stats().keys, vec!["projects:list".to_string()]);
//! ```

mod stats;
mod store;

pub use stats::CacheStats;
pub use store::ResponseCache;
