//! The safe call runner

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use balance_domain::{Locale, SafeCallConfig};
use futures::future::{join_all, BoxFuture, FutureExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, instrument, warn, Instrument};

use super::empty::EmptyCheck;
use super::notifier::{FailureNotifier, TracingNotifier};
use super::options::CallOptions;
use super::outcome::{Metadata, Outcome, SuccessStatus};
use crate::cache::ResponseCache;
use crate::error::messages::{default_batch_message, user_message};
use crate::error::{CallError, CallResult, ErrorKind};
use crate::resilience::{RetryDecision, RetryPolicy};

/// Type-erased operation, so differently-typed closures fit one batch
pub type BoxedOperation<T> = Box<dyn FnMut() -> BoxFuture<'static, CallResult<T>> + Send>;

/// Member of a batch: a label for logs, the operation and its own message
pub struct NamedOperation<T> {
    pub name: String,
    pub error_message: Option<String>,
    operation: BoxedOperation<T>,
}

impl<T> NamedOperation<T> {
    pub fn new<F, Fut>(name: impl Into<String>, mut operation: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = CallResult<T>> + Send + 'static,
    {
        Self {
            name: name.into(),
            error_message: None,
            operation: Box::new(move || operation().boxed()),
        }
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

impl<T> fmt::Debug for NamedOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedOperation")
            .field("name", &self.name)
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

/// Wraps fallible async operations with timeout, retry, caching and
/// cancellation, always producing exactly one [`Outcome`].
///
/// Cheap to clone; clones share the response cache and the notifier.
///
/// # Example
/// ```no_run
/// use balance_common::{CallError, CallOptions, ResponseCache, SafeCallRunner};
///
/// # async fn example() {
/// let runner = SafeCallRunner::new(ResponseCache::new());
/// let outcome = runner
///     .run(
///         || async { Ok::<_, CallError>(vec!["Tower A".to_string()]) },
///         "Failed to load projects",
///         CallOptions::new().cached("projects:list"),
///     )
///     .await;
/// assert!(outcome.is_success());
/// # }
/// ```
#[derive(Clone)]
pub struct SafeCallRunner {
    cache: ResponseCache,
    policy: RetryPolicy,
    notifier: Arc<dyn FailureNotifier>,
    locale: Locale,
    cache_ttl: Duration,
    notify_on_failure: bool,
}

impl fmt::Debug for SafeCallRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeCallRunner")
            .field("policy", &self.policy)
            .field("locale", &self.locale)
            .field("cache_ttl", &self.cache_ttl)
            .field("notify_on_failure", &self.notify_on_failure)
            .finish_non_exhaustive()
    }
}

impl SafeCallRunner {
    /// Runner with the dashboard defaults over a shared cache
    pub fn new(cache: ResponseCache) -> Self {
        Self::from_config(&SafeCallConfig::default(), cache)
    }

    pub fn from_config(config: &SafeCallConfig, cache: ResponseCache) -> Self {
        Self {
            cache,
            policy: RetryPolicy::from(config),
            notifier: Arc::new(TracingNotifier),
            locale: config.locale,
            cache_ttl: config.cache_ttl(),
            notify_on_failure: config.notify_on_failure,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_notifier(mut self, notifier: impl FailureNotifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn with_shared_notifier(mut self, notifier: Arc<dyn FailureNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// TTL used when a call enables caching without its own TTL
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Drop every cached response
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Run `operation` under the effective policy.
    ///
    /// A live cache entry short-circuits without invoking the operation,
    /// unless the call asked for a refresh.
    /// Otherwise each attempt is raced against the attempt timeout and the
    /// cancellation token; transient failures are retried with backoff until
    /// the budget is spent. `error_message` is shown for failures that have
    /// no fixed localized text.
    #[instrument(skip(self, operation, options), fields(cache_key))]
    pub async fn run<T, F, Fut>(
        &self,
        mut operation: F,
        error_message: &str,
        options: CallOptions,
    ) -> Outcome<T>
    where
        T: EmptyCheck + Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = CallResult<T>>,
    {
        let started = Instant::now();
        let policy = options.policy(&self.policy);
        let cancel = options.cancellation.clone();

        if let Some(cache) = &options.cache {
            tracing::Span::current().record("cache_key", cache.key.as_str());
            let ttl = cache.ttl.unwrap_or(self.cache_ttl);
            let cached = if cache.refresh { None } else { self.cache.get::<T>(&cache.key, ttl) };
            if let Some(value) = cached {
                debug!("Serving response from cache");
                let metadata =
                    Metadata { elapsed: started.elapsed(), retry_count: 0, served_from_cache: true };
                let status = classify(&value);
                return Outcome::success(value, status, metadata);
            }
        }

        let mut attempts = 0u32;
        loop {
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return self.cancelled(started, attempts);
            }

            attempts += 1;
            debug!(attempt = attempts, max_attempts = policy.max_attempts(), "Executing operation");

            let error = match attempt(operation(), policy.timeout, cancel.as_ref()).await {
                Ok(value) => {
                    if let Some(cache) = &options.cache {
                        self.cache.set(cache.key.clone(), value.clone());
                    }
                    if attempts > 1 {
                        debug!(retries = attempts - 1, "Operation succeeded after retries");
                    }
                    let metadata = Metadata {
                        elapsed: started.elapsed(),
                        retry_count: attempts - 1,
                        served_from_cache: false,
                    };
                    let status = classify(&value);
                    return Outcome::success(value, status, metadata);
                }
                Err(error) => error,
            };

            let kind = error.kind();
            if kind == ErrorKind::Cancelled {
                return self.cancelled(started, attempts);
            }

            match policy.decide(kind, attempts) {
                RetryDecision::Retry(delay) => {
                    warn!(attempt = attempts, %kind, error = %error, ?delay, "Attempt failed, retrying");
                    if !backoff(delay, cancel.as_ref()).await {
                        return self.cancelled(started, attempts);
                    }
                }
                RetryDecision::Stop => {
                    let notify = options.notify_on_failure.unwrap_or(self.notify_on_failure);
                    return self.fail(kind, &error, error_message, notify, started, attempts);
                }
            }
        }
    }

    /// Run every operation concurrently; outcomes are index-aligned with the
    /// input and one failure never affects another.
    ///
    /// When `options` enables caching, each member caches under
    /// `<key>:<name>`.
    #[instrument(skip_all, fields(count = operations.len()))]
    pub async fn run_batch<T>(
        &self,
        operations: Vec<NamedOperation<T>>,
        options: CallOptions,
    ) -> Vec<Outcome<T>>
    where
        T: EmptyCheck + Clone + Send + Sync + 'static,
    {
        let fallback = default_batch_message(self.locale);
        let calls = operations.into_iter().map(|member| {
            let options = options.scoped(&member.name);
            let span = info_span!("batch_member", name = %member.name);
            async move {
                let message = member.error_message.as_deref().unwrap_or(fallback);
                self.run(member.operation, message, options).await
            }
            .instrument(span)
        });
        join_all(calls).await
    }

    fn cancelled<T>(&self, started: Instant, attempts: u32) -> Outcome<T> {
        debug!(attempts, "Call cancelled");
        let metadata = Metadata {
            elapsed: started.elapsed(),
            retry_count: attempts.saturating_sub(1),
            served_from_cache: false,
        };
        Outcome::failure(
            ErrorKind::Cancelled,
            user_message(ErrorKind::Cancelled, self.locale, ""),
            metadata,
        )
    }

    fn fail<T>(
        &self,
        kind: ErrorKind,
        error: &CallError,
        error_message: &str,
        notify: bool,
        started: Instant,
        attempts: u32,
    ) -> Outcome<T> {
        let message = user_message(kind, self.locale, error_message);
        let elapsed = started.elapsed();
        warn!(%kind, error = %error, attempts, elapsed_ms = elapsed.as_millis() as u64, "Call failed");

        if notify {
            self.notifier.notify(kind, &message);
        }

        let metadata =
            Metadata { elapsed, retry_count: attempts.saturating_sub(1), served_from_cache: false };
        Outcome::failure(kind, message, metadata)
    }
}

fn classify<T: EmptyCheck>(value: &T) -> SuccessStatus {
    if value.is_empty_result() {
        SuccessStatus::Empty
    } else {
        SuccessStatus::Success
    }
}

/// One attempt raced against its deadline and the caller's token.
///
/// Losing the race drops the operation future, aborting the request.
async fn attempt<T, Fut>(
    fut: Fut,
    timeout: Duration,
    cancel: Option<&CancellationToken>,
) -> CallResult<T>
where
    Fut: Future<Output = CallResult<T>>,
{
    let timed = tokio::time::timeout(timeout, fut);
    let result = match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => return Err(CallError::Cancelled),
            result = timed => result,
        },
        None => timed.await,
    };
    result.unwrap_or(Err(CallError::Timeout(timeout)))
}

/// Sleep before the next attempt; `false` if cancelled while waiting
async fn backoff(delay: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        },
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}
