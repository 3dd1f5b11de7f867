//! Per-call overrides

use std::time::Duration;

use balance_domain::constants::{DEFAULT_MAX_ITEMS_PER_PAGE, DEFAULT_MAX_TOTAL_ITEMS};
use tokio_util::sync::CancellationToken;

use crate::resilience::RetryPolicy;

/// Cache participation for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub key: String,
    /// Freshness tolerance; the runner's default TTL when `None`
    pub ttl: Option<Duration>,
    /// Skip the cached read but still store a fresh success
    pub refresh: bool,
}

/// Partial overrides of the runner's defaults for one call
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub max_retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub timeout: Option<Duration>,
    /// Caching is off unless a key is supplied
    pub cache: Option<CacheOptions>,
    pub notify_on_failure: Option<bool>,
    pub cancellation: Option<CancellationToken>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Serve from and populate the cache under `key` with the default TTL
    pub fn cached(mut self, key: impl Into<String>) -> Self {
        self.cache = Some(CacheOptions { key: key.into(), ttl: None, refresh: false });
        self
    }

    pub fn cached_for(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.cache = Some(CacheOptions { key: key.into(), ttl: Some(ttl), refresh: false });
        self
    }

    /// Always invoke the operation, then overwrite the cache entry on
    /// success. No effect unless caching is enabled.
    pub fn refreshed(mut self) -> Self {
        if let Some(cache) = self.cache.as_mut() {
            cache.refresh = true;
        }
        self
    }

    /// Suppress the user-facing failure notification
    pub fn silent(mut self) -> Self {
        self.notify_on_failure = Some(false);
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Effective policy: these overrides layered over `base`
    pub fn policy(&self, base: &RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            base_delay: self.retry_delay.unwrap_or(base.base_delay),
            timeout: self.timeout.unwrap_or(base.timeout),
            backoff: base.backoff,
        }
    }

    /// Same overrides with the cache key suffixed, so derived calls do not
    /// share an entry with their parent
    pub(crate) fn scoped(&self, suffix: &str) -> Self {
        let mut scoped = self.clone();
        if let Some(cache) = scoped.cache.as_mut() {
            cache.key = format!("{}:{suffix}", cache.key);
        }
        scoped
    }
}

/// Limits for a paginated load
#[derive(Debug, Clone)]
pub struct PaginationOptions {
    pub max_items_per_page: u32,
    pub max_total_items: u64,
    pub error_message: Option<String>,
    /// Applied to each page request
    pub call: CallOptions,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            max_items_per_page: DEFAULT_MAX_ITEMS_PER_PAGE,
            max_total_items: DEFAULT_MAX_TOTAL_ITEMS,
            error_message: None,
            call: CallOptions::default(),
        }
    }
}

impl PaginationOptions {
    pub fn max_items_per_page(mut self, per_page: u32) -> Self {
        self.max_items_per_page = per_page;
        self
    }

    pub fn max_total_items(mut self, total: u64) -> Self {
        self.max_total_items = total;
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn call(mut self, call: CallOptions) -> Self {
        self.call = call;
        self
    }
}
