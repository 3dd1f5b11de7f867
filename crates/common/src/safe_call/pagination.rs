//! Paginated loads with a size probe

use std::future::Future;

use balance_domain::constants::{PAGINATION_ADVISORY_THRESHOLD, PROBE_PAGE_SIZE};
use balance_domain::PaginatedResponse;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::options::PaginationOptions;
use super::outcome::{Metadata, Outcome, SuccessStatus};
use super::runner::SafeCallRunner;
use crate::error::messages::{
    default_pagination_message, pagination_advisory, pagination_over_limit,
};
use crate::error::CallResult;

/// One page as returned by a page fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> From<PaginatedResponse<T>> for Page<T> {
    fn from(resp: PaginatedResponse<T>) -> Self {
        Self { items: resp.items, total_items: resp.total_items, total_pages: resp.total_pages }
    }
}

/// Result of a paginated load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
    /// Set when the listing is large enough to hurt rendering
    pub performance_warning: Option<String>,
}

impl SafeCallRunner {
    /// Load a listing through `fetch_page(page, page_size)`.
    ///
    /// Page 1 is first fetched with `min(max_items_per_page, 10)` items to
    /// learn the total. A listing that fits in one page of
    /// `max_items_per_page` is returned whole, refetching page 1 at full size
    /// when the probe did not already hold every item. Larger listings return
    /// the probe page only, with an advisory asking the caller to paginate.
    #[instrument(skip(self, fetch_page, options), fields(max_per_page = options.max_items_per_page))]
    pub async fn run_paginated<T, F, Fut>(
        &self,
        mut fetch_page: F,
        options: PaginationOptions,
    ) -> Outcome<PageResult<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = CallResult<Page<T>>>,
    {
        let started = Instant::now();
        let locale = self.locale();
        let error_message = options
            .error_message
            .clone()
            .unwrap_or_else(|| default_pagination_message(locale).to_string());

        let probe_size = options.max_items_per_page.min(PROBE_PAGE_SIZE);
        let probe = self
            .run(|| fetch_page(1, probe_size), &error_message, options.call.scoped("probe"))
            .await;

        let (probe_page, probe_meta) = match probe {
            Outcome::Success { value, metadata, .. } => (value, metadata),
            Outcome::Failure { kind, message, metadata } => {
                return Outcome::failure(kind, message, metadata);
            }
        };

        let total_items = probe_page.total_items;
        let over_limit = (total_items > options.max_total_items).then(|| {
            warn!(total_items, max_total = options.max_total_items, "Listing exceeds total limit");
            pagination_over_limit(locale, total_items)
        });

        if total_items <= u64::from(options.max_items_per_page) {
            let (page, metadata) = if (probe_page.items.len() as u64) < total_items {
                debug!(total_items, "Probe page incomplete, fetching full page");
                let full = self
                    .run(
                        || fetch_page(1, options.max_items_per_page),
                        &error_message,
                        options.call.scoped("full"),
                    )
                    .await;
                match full {
                    Outcome::Success { value, metadata, .. } => {
                        (value, merge_metadata(started, probe_meta, metadata))
                    }
                    Outcome::Failure { kind, message, metadata } => {
                        return Outcome::failure(
                            kind,
                            message,
                            merge_metadata(started, probe_meta, metadata),
                        );
                    }
                }
            } else {
                (probe_page, Metadata { elapsed: started.elapsed(), ..probe_meta })
            };

            let status =
                if page.items.is_empty() { SuccessStatus::Empty } else { SuccessStatus::Success };
            let result = PageResult {
                items: page.items,
                total_items: page.total_items,
                total_pages: page.total_pages,
                performance_warning: over_limit.clone(),
            };
            return Outcome::success(result, status, metadata).with_warning(over_limit);
        }

        let advisory = over_limit.or_else(|| {
            (total_items > PAGINATION_ADVISORY_THRESHOLD)
                .then(|| pagination_advisory(locale).to_string())
        });
        let result = PageResult {
            items: probe_page.items,
            total_items,
            total_pages: probe_page.total_pages,
            performance_warning: advisory.clone(),
        };
        let metadata = Metadata { elapsed: started.elapsed(), ..probe_meta };
        Outcome::success(result, SuccessStatus::Success, metadata).with_warning(advisory)
    }
}

/// Combine the probe and follow-up call into one metadata record
fn merge_metadata(started: Instant, probe: Metadata, follow_up: Metadata) -> Metadata {
    Metadata {
        elapsed: started.elapsed(),
        retry_count: probe.retry_count + follow_up.retry_count,
        served_from_cache: probe.served_from_cache && follow_up.served_from_cache,
    }
}
