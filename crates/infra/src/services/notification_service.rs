//! Notification service over the REST API.
//!
//! Every call goes through the shared [`SafeCallRunner`] with the
//! notification policy: one retry and a five second attempt timeout. Reads
//! are cached in the runner's response cache under the `notifications:`
//! prefix.
//!
//! # Caching Strategy
//!
//! - **Read-through**: listings are cached for 30 s per filter combination,
//!   the unread count for 15 s
//! - **Write-through invalidation**: a successful command drops every
//!   `notifications:` entry so the next read sees the server state
//! - **Failures are never cached**
//! - **Poller refresh**: the poller's reads skip the cached value and store
//!   what the server returned, so request paths see its fresher data
//!
//! # Backend Availability
//!
//! Some deployments do not expose the notification endpoints at all. The
//! service reads the readiness gate (driven by a
//! [`NotificationPoller`](balance_common::NotificationPoller)) and, once the
//! gate reports `NotReady`, answers locally without touching the network:
//! listings come back empty, the unread count is zero and commands are
//! acknowledged as applied locally.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use balance_common::{NotificationPoller, ResponseCache, SafeCallRunner};
//! use balance_domain::{NotificationConfig, NotificationFilters};
//! use balance_infra::http::ApiClient;
//! use balance_infra::services::NotificationService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::builder().base_url("https://balance.example").build()?;
//! let runner = SafeCallRunner::new(ResponseCache::new());
//! let service = Arc::new(NotificationService::new(client, runner));
//!
//! let mut poller = NotificationPoller::with_gate(
//!     Arc::clone(&service),
//!     service.gate(),
//!     NotificationConfig::default().poll_interval(),
//! );
//! poller.start().await?;
//!
//! let page = service.list(&NotificationFilters::default()).await;
//! if let Some(page) = page.value() {
//!     println!("{} notifications", page.total_items);
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use balance_common::readiness::GateHandle;
use balance_common::{
    CallOptions, CallResult, ErrorKind, GateState, Metadata, NotificationSource, Outcome,
    SafeCallRunner, SuccessStatus,
};
use balance_domain::constants::{
    DEFAULT_PAGE_SIZE, NOTIFICATION_CALL_TIMEOUT_MS, NOTIFICATION_COUNT_CACHE_TTL_MS,
    NOTIFICATION_LIST_CACHE_TTL_MS, NOTIFICATION_MAX_RETRIES,
};
use balance_domain::{
    ApiResponse, IdsRequest, Locale, Notification, NotificationFilters, PaginatedResponse,
    UnreadCount,
};
use tracing::{debug, instrument};

use crate::http::ApiClient;

/// Prefix shared by every notification cache key
pub const CACHE_PREFIX: &str = "notifications:";

const UNREAD_COUNT_KEY: &str = "notifications:unread-count";

/// Notification endpoints wrapped with retry, caching and the readiness gate.
///
/// Cloning is cheap; clones share the client, the runner's cache and the
/// gate.
#[derive(Debug, Clone)]
pub struct NotificationService {
    client: ApiClient,
    runner: SafeCallRunner,
    gate: GateHandle,
}

impl NotificationService {
    /// Service with a fresh gate in `Checking`
    pub fn new(client: ApiClient, runner: SafeCallRunner) -> Self {
        Self { client, runner, gate: GateHandle::default() }
    }

    /// Share an existing gate, e.g. one owned by a running poller
    pub fn with_gate(mut self, gate: GateHandle) -> Self {
        self.gate = gate;
        self
    }

    /// Handle to the gate this service reads
    pub fn gate(&self) -> GateHandle {
        self.gate.clone()
    }

    /// `false` once the backend has been found to lack notifications
    pub fn is_available(&self) -> bool {
        self.gate.state() != GateState::NotReady
    }

    /// Forget what is known about the backend and drop cached responses.
    ///
    /// The gate returns to `Checking`, so the next poller tick probes again.
    pub fn reset_backend_status(&self) {
        self.gate.reset();
        let removed = self.runner.cache().remove_prefix(CACHE_PREFIX);
        debug!(removed, "Notification backend status reset");
    }

    /// One page of notifications matching `filters`
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filters: &NotificationFilters,
    ) -> Outcome<PaginatedResponse<Notification>> {
        if !self.is_available() {
            let page_size = filters.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
            return local_success(PaginatedResponse::empty(page_size), SuccessStatus::Empty);
        }
        self.fetch_list(filters, Caller::User).await
    }

    /// A single notification by id
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Outcome<Notification> {
        let locale = self.runner.locale();
        if !self.is_available() {
            return Outcome::failure(
                ErrorKind::NotFound,
                Text::Unavailable.render(locale),
                Metadata::default(),
            );
        }

        let path = format!("/Notification/{id}");
        self.runner
            .run(
                || self.client.get::<Notification>(&path, &[]),
                &Text::GetFailed(id).render(locale),
                read_options(),
            )
            .await
    }

    /// Number of unread notifications; zero while the backend lacks the
    /// feature
    #[instrument(skip(self))]
    pub async fn unread_count(&self) -> Outcome<u64> {
        if !self.is_available() {
            return local_success(0, SuccessStatus::Empty);
        }
        self.fetch_unread_count(Caller::User).await
    }

    #[instrument(skip(self))]
    pub async fn mark_as_read(&self, id: i64) -> Outcome<ApiResponse> {
        let path = format!("/Notification/{id}/read");
        self.command(
            || self.client.put::<Option<ApiResponse>>(&path),
            Text::MarkReadFailed(id),
            Text::MarkedReadLocally,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn mark_many_as_read(&self, ids: &[i64]) -> Outcome<ApiResponse> {
        let body = IdsRequest { ids: ids.to_vec() };
        self.command(
            || self.client.put_json::<_, Option<ApiResponse>>("/Notification/mark-read", &body),
            Text::MarkManyReadFailed,
            Text::MarkedReadLocally,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn mark_all_as_read(&self) -> Outcome<ApiResponse> {
        self.command(
            || self.client.put::<Option<ApiResponse>>("/Notification/mark-all-read"),
            Text::MarkAllReadFailed,
            Text::MarkedAllReadLocally,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Outcome<ApiResponse> {
        let path = format!("/Notification/{id}");
        self.command(
            || self.client.delete::<Option<ApiResponse>>(&path),
            Text::DeleteFailed(id),
            Text::DeletedLocally,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_many(&self, ids: &[i64]) -> Outcome<ApiResponse> {
        let body = IdsRequest { ids: ids.to_vec() };
        self.command(
            || self.client.post::<_, Option<ApiResponse>>("/Notification/bulk-delete", &body),
            Text::DeleteManyFailed,
            Text::DeletedManyLocally,
        )
        .await
    }

    async fn fetch_list(
        &self,
        filters: &NotificationFilters,
        caller: Caller,
    ) -> Outcome<PaginatedResponse<Notification>> {
        let query = filters.to_query();
        let key = format!("{CACHE_PREFIX}list:{}", filters.cache_fragment());
        let ttl = Duration::from_millis(NOTIFICATION_LIST_CACHE_TTL_MS);
        let options = caller.options(read_options().cached_for(key, ttl));

        self.runner
            .run(
                || self.client.get::<PaginatedResponse<Notification>>("/Notification", &query),
                &Text::ListFailed.render(self.runner.locale()),
                options,
            )
            .await
    }

    async fn fetch_unread_count(&self, caller: Caller) -> Outcome<u64> {
        let ttl = Duration::from_millis(NOTIFICATION_COUNT_CACHE_TTL_MS);
        let options = caller.options(read_options().cached_for(UNREAD_COUNT_KEY, ttl));

        self.runner
            .run(
                || {
                    let client = &self.client;
                    async move {
                        client
                            .get::<UnreadCount>("/Notification/unread-count", &[])
                            .await
                            .map(|body| body.count)
                    }
                },
                &Text::UnreadCountFailed.render(self.runner.locale()),
                options,
            )
            .await
    }

    /// Run a state-changing call; on success every cached notification
    /// response is dropped.
    async fn command<F, Fut>(&self, operation: F, failed: Text, local: Text) -> Outcome<ApiResponse>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = CallResult<Option<ApiResponse>>>,
    {
        let locale = self.runner.locale();
        if !self.is_available() {
            debug!("Notifications unavailable, acknowledging command locally");
            return local_success(
                ApiResponse::acknowledged(local.render(locale)),
                SuccessStatus::Success,
            );
        }

        let options = CallOptions::new()
            .max_retries(NOTIFICATION_MAX_RETRIES)
            .timeout(Duration::from_millis(NOTIFICATION_CALL_TIMEOUT_MS));
        let outcome = self
            .runner
            .run(
                || {
                    let call = operation();
                    async move { call.await.map(|body| body.unwrap_or_else(accepted)) }
                },
                &failed.render(locale),
                options,
            )
            .await;

        if outcome.is_success() {
            let removed = self.runner.cache().remove_prefix(CACHE_PREFIX);
            debug!(removed, "Invalidated cached notification responses");
        }
        outcome
    }
}

#[async_trait]
impl NotificationSource for NotificationService {
    type Item = Notification;

    async fn unread_count(&self) -> Outcome<u64> {
        self.fetch_unread_count(Caller::Poller).await
    }

    async fn list(&self) -> Outcome<Vec<Notification>> {
        self.fetch_list(&NotificationFilters::default(), Caller::Poller)
            .await
            .map(|page| page.items)
    }
}

fn read_options() -> CallOptions {
    CallOptions::new()
        .max_retries(NOTIFICATION_MAX_RETRIES)
        .timeout(Duration::from_millis(NOTIFICATION_CALL_TIMEOUT_MS))
}

/// Who is reading; decides how the shared cache entries are used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Caller {
    /// Dashboard request paths: read-through, toast on failure
    User,
    /// The notification poller: always reaches the server so a grown count
    /// is never answered from a stale entry, stores the fresh value for
    /// request paths, never toasts
    Poller,
}

impl Caller {
    fn options(self, cached: CallOptions) -> CallOptions {
        match self {
            Self::User => cached,
            Self::Poller => cached.refreshed().silent(),
        }
    }
}

fn local_success<T>(value: T, status: SuccessStatus) -> Outcome<T> {
    Outcome::success(value, status, Metadata::default())
}

/// Envelope for commands answered with an empty body
fn accepted() -> ApiResponse {
    ApiResponse { data: None, message: None, success: true, errors: Vec::new() }
}

/// Notification-specific user-facing text
#[derive(Debug, Clone, Copy)]
enum Text {
    ListFailed,
    GetFailed(i64),
    Unavailable,
    UnreadCountFailed,
    MarkReadFailed(i64),
    MarkManyReadFailed,
    MarkAllReadFailed,
    DeleteFailed(i64),
    DeleteManyFailed,
    MarkedReadLocally,
    MarkedAllReadLocally,
    DeletedLocally,
    DeletedManyLocally,
}

impl Text {
    fn render(self, locale: Locale) -> String {
        match (locale, self) {
            (Locale::Arabic, Self::ListFailed) => "فشل في تحميل الإشعارات".to_string(),
            (Locale::Arabic, Self::GetFailed(id)) => format!("فشل في تحميل الإشعار رقم {id}"),
            (Locale::Arabic, Self::Unavailable) => "خدمة الإشعارات غير متاحة حالياً".to_string(),
            (Locale::Arabic, Self::UnreadCountFailed) => {
                "فشل في تحميل عدد الإشعارات غير المقروءة".to_string()
            }
            (Locale::Arabic, Self::MarkReadFailed(id)) => {
                format!("فشل في وضع علامة قراءة للإشعار رقم {id}")
            }
            (Locale::Arabic, Self::MarkManyReadFailed) => {
                "فشل في وضع علامة قراءة للإشعارات المحددة".to_string()
            }
            (Locale::Arabic, Self::MarkAllReadFailed) => {
                "فشل في وضع علامة قراءة لجميع الإشعارات".to_string()
            }
            (Locale::Arabic, Self::DeleteFailed(id)) => format!("فشل في حذف الإشعار رقم {id}"),
            (Locale::Arabic, Self::DeleteManyFailed) => "فشل في حذف الإشعارات المحددة".to_string(),
            (Locale::Arabic, Self::MarkedReadLocally) => "تم وضع علامة قراءة محلياً".to_string(),
            (Locale::Arabic, Self::MarkedAllReadLocally) => {
                "تم وضع علامة قراءة لجميع الإشعارات محلياً".to_string()
            }
            (Locale::Arabic, Self::DeletedLocally) => "تم حذف الإشعار محلياً".to_string(),
            (Locale::Arabic, Self::DeletedManyLocally) => "تم حذف الإشعارات محلياً".to_string(),

            (Locale::English, Self::ListFailed) => "Failed to load notifications".to_string(),
            (Locale::English, Self::GetFailed(id)) => format!("Failed to load notification #{id}"),
            (Locale::English, Self::Unavailable) => {
                "The notifications service is currently unavailable".to_string()
            }
            (Locale::English, Self::UnreadCountFailed) => {
                "Failed to load the unread notification count".to_string()
            }
            (Locale::English, Self::MarkReadFailed(id)) => {
                format!("Failed to mark notification #{id} as read")
            }
            (Locale::English, Self::MarkManyReadFailed) => {
                "Failed to mark the selected notifications as read".to_string()
            }
            (Locale::English, Self::MarkAllReadFailed) => {
                "Failed to mark all notifications as read".to_string()
            }
            (Locale::English, Self::DeleteFailed(id)) => {
                format!("Failed to delete notification #{id}")
            }
            (Locale::English, Self::DeleteManyFailed) => {
                "Failed to delete the selected notifications".to_string()
            }
            (Locale::English, Self::MarkedReadLocally) => "Marked as read locally".to_string(),
            (Locale::English, Self::MarkedAllReadLocally) => {
                "Marked all notifications as read locally".to_string()
            }
            (Locale::English, Self::DeletedLocally) => "Notification deleted locally".to_string(),
            (Locale::English, Self::DeletedManyLocally) => {
                "Notifications deleted locally".to_string()
            }
        }
    }
}
