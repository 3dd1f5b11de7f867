//! Application constants
//!
//! Defaults mirrored by the dashboard's REST client and call wrapper.

// REST API
pub const DEFAULT_API_BASE_URL: &str = "https://balancerealestate.runasp.net";
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

// Safe call policy
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CACHE_TTL_MS: u64 = 5 * 60 * 1_000;

// Response cache sweep
pub const CACHE_ENTRY_CEILING: usize = 100;
pub const CACHE_SWEEP_NUMERATOR: usize = 1;
pub const CACHE_SWEEP_DENOMINATOR: usize = 4;

// Pagination
pub const DEFAULT_MAX_ITEMS_PER_PAGE: u32 = 50;
pub const DEFAULT_MAX_TOTAL_ITEMS: u64 = 1_000;
pub const PROBE_PAGE_SIZE: u32 = 10;
pub const PAGINATION_ADVISORY_THRESHOLD: u64 = 100;

// Notifications
pub const DEFAULT_NOTIFICATION_POLL_SECS: u64 = 120;
pub const DEFAULT_MAX_PROBE_ATTEMPTS: u32 = 3;
pub const NOTIFICATION_LIST_CACHE_TTL_MS: u64 = 30_000;
pub const NOTIFICATION_COUNT_CACHE_TTL_MS: u64 = 15_000;
pub const NOTIFICATION_CALL_TIMEOUT_MS: u64 = 5_000;
pub const NOTIFICATION_MAX_RETRIES: u32 = 1;
