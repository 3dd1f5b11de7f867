//! Integration tests for `balance_common::safe_call`.
//!
//! Exercise the runner end to end with scripted operations under paused
//! tokio time: retry budgets, cache short-circuiting, batch isolation,
//! probe-first pagination and cancellation.

#![cfg(feature = "test-utils")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use balance_common::testing::{RecordingNotifier, ScriptedOperation};
use balance_common::{
    CallError, CallOptions, ErrorKind, NamedOperation, Page, PaginationOptions, ResponseCache,
    RetryPolicy, SafeCallRunner, SuccessStatus,
};
use balance_domain::Locale;
use tokio_util::sync::CancellationToken;

fn runner_with(notifier: &RecordingNotifier) -> SafeCallRunner {
    SafeCallRunner::new(ResponseCache::new()).with_notifier(notifier.clone())
}

/// Validates a first-attempt success reports no retries.
///
/// Assertions:
/// - Outcome is `Success` with status `Success`.
/// - `retry_count` is 0 and the result was not served from cache.
/// - The operation ran exactly once.
#[tokio::test(start_paused = true)]
async fn first_attempt_success_has_zero_retries() {
    let notifier = RecordingNotifier::new();
    let runner = runner_with(&notifier);
    let op = ScriptedOperation::succeeding(vec![1, 2, 3]);

    let outcome = runner.run(op.operation(), "failed", CallOptions::new()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.status(), Some(SuccessStatus::Success));
    assert_eq!(outcome.metadata().retry_count, 0);
    assert!(!outcome.metadata().served_from_cache);
    assert_eq!(op.invocations(), 1);
    assert_eq!(notifier.count(), 0);
}

/// Validates an always-transient failure uses the whole retry budget.
///
/// Assertions:
/// - The operation runs `max_retries + 1` times.
/// - Outcome is `Failure` with kind `http-5xx` and the localized text.
/// - The notifier saw exactly one message.
#[tokio::test(start_paused = true)]
async fn transient_failure_exhausts_budget() {
    let notifier = RecordingNotifier::new();
    let runner = runner_with(&notifier);
    let op = ScriptedOperation::<Vec<u32>>::failing(CallError::http(503, "unavailable"));

    let outcome = runner.run(op.operation(), "failed", CallOptions::new().max_retries(3)).await;

    assert_eq!(op.invocations(), 4);
    assert_eq!(outcome.kind(), Some(ErrorKind::Server));
    assert_eq!(outcome.message(), Some("خطأ في الخادم. يرجى المحاولة لاحقاً."));
    assert_eq!(outcome.metadata().retry_count, 3);
    assert_eq!(notifier.calls(), vec![(ErrorKind::Server, "خطأ في الخادم. يرجى المحاولة لاحقاً.".to_string())]);
}

/// Validates retries back off linearly: 1 s, 2 s, 3 s.
#[tokio::test(start_paused = true)]
async fn retry_delays_grow_linearly() {
    let runner = SafeCallRunner::new(ResponseCache::new())
        .with_notifier(|_: ErrorKind, _: &str| {})
        .with_policy(
            RetryPolicy::builder()
                .max_retries(3)
                .base_delay(Duration::from_secs(1))
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap(),
        );
    let op = ScriptedOperation::<String>::failing(CallError::network("reset"));

    let started = tokio::time::Instant::now();
    let outcome = runner.run(op.operation(), "failed", CallOptions::new()).await;

    assert_eq!(outcome.kind(), Some(ErrorKind::Network));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(6), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(7), "elapsed {elapsed:?}");
}

/// Validates a non-transient failure is never retried.
#[tokio::test(start_paused = true)]
async fn not_found_runs_once() {
    let notifier = RecordingNotifier::new();
    let runner = runner_with(&notifier);
    let op = ScriptedOperation::<String>::failing(CallError::http(404, "no such property"));

    let outcome = runner.run(op.operation(), "failed", CallOptions::new()).await;

    assert_eq!(op.invocations(), 1);
    assert_eq!(outcome.kind(), Some(ErrorKind::NotFound));
    assert_eq!(outcome.metadata().retry_count, 0);
}

/// Validates unknown failures surface the caller's message.
#[tokio::test(start_paused = true)]
async fn unknown_failure_uses_caller_message() {
    let notifier = RecordingNotifier::new();
    let runner = runner_with(&notifier);
    let op = ScriptedOperation::<String>::failing(CallError::http(409, "conflict"));

    let outcome = runner.run(op.operation(), "تعذر حفظ العقار", CallOptions::new()).await;

    assert_eq!(outcome.kind(), Some(ErrorKind::Unknown));
    assert_eq!(outcome.message(), Some("تعذر حفظ العقار"));
    assert_eq!(notifier.last_message().as_deref(), Some("تعذر حفظ العقار"));
}

/// Validates a transient failure followed by success.
///
/// Assertions:
/// - Outcome is `Success` after two attempts.
/// - `retry_count` is 1 and nobody was notified.
#[tokio::test(start_paused = true)]
async fn recovers_after_one_retry() {
    let notifier = RecordingNotifier::new();
    let runner = runner_with(&notifier);
    let op = ScriptedOperation::new(vec![Err(CallError::network("reset")), Ok("ok".to_string())]);

    let outcome = runner.run(op.operation(), "failed", CallOptions::new()).await;

    assert_eq!(outcome.value().map(String::as_str), Some("ok"));
    assert_eq!(outcome.metadata().retry_count, 1);
    assert_eq!(notifier.count(), 0);
}

/// Validates an attempt that never finishes resolves as a timeout.
#[tokio::test(start_paused = true)]
async fn slow_attempts_time_out() {
    let runner = SafeCallRunner::new(ResponseCache::new()).with_notifier(|_: ErrorKind, _: &str| {});
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let outcome = runner
        .run(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, CallError>(1u32)
                }
            },
            "failed",
            CallOptions::new().timeout(Duration::from_millis(100)).max_retries(1),
        )
        .await;

    assert_eq!(outcome.kind(), Some(ErrorKind::Timeout));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Validates cached results short-circuit the operation.
///
/// Assertions:
/// - The second call is served from cache with zero retries.
/// - The operation ran exactly once.
/// - `clear_cache` forces the next call to run the operation again.
#[tokio::test(start_paused = true)]
async fn cached_result_is_reused() {
    let runner = SafeCallRunner::new(ResponseCache::new());
    let op = ScriptedOperation::succeeding(vec!["villa".to_string()]);
    let options = || CallOptions::new().cached("properties:featured");

    let first = runner.run(op.operation(), "failed", options()).await;
    let second = runner.run(op.operation(), "failed", options()).await;

    assert_eq!(first.value(), second.value());
    assert!(second.metadata().served_from_cache);
    assert_eq!(second.metadata().retry_count, 0);
    assert_eq!(op.invocations(), 1);

    runner.clear_cache();
    runner.run(op.operation(), "failed", options()).await;
    assert_eq!(op.invocations(), 2);
}

/// Validates failures are never cached.
#[tokio::test(start_paused = true)]
async fn failures_are_not_cached() {
    let runner = SafeCallRunner::new(ResponseCache::new()).with_notifier(|_: ErrorKind, _: &str| {});
    let op = ScriptedOperation::new(vec![
        Err(CallError::http(404, "missing")),
        Ok(7u64),
    ]);

    let first = runner.run(op.operation(), "failed", CallOptions::new().cached("count")).await;
    let second = runner.run(op.operation(), "failed", CallOptions::new().cached("count")).await;

    assert!(first.is_failure());
    assert_eq!(second.value(), Some(&7));
    assert!(!second.metadata().served_from_cache);
    assert_eq!(op.invocations(), 2);
}

/// Validates a refreshed call bypasses a live entry and replaces it.
///
/// Assertions:
/// - The refreshed call runs the operation even though the entry is live.
/// - A later plain cached call sees the refreshed value.
#[tokio::test(start_paused = true)]
async fn refreshed_call_skips_live_entry_and_overwrites_it() {
    let runner = SafeCallRunner::new(ResponseCache::new()).with_notifier(|_: ErrorKind, _: &str| {});
    let op = ScriptedOperation::new(vec![Ok(2u64), Ok(3u64)]);
    let options = || CallOptions::new().cached_for("unread", Duration::from_secs(15));

    runner.run(op.operation(), "failed", options()).await;
    let refreshed = runner.run(op.operation(), "failed", options().refreshed()).await;
    let cached = runner.run(op.operation(), "failed", options()).await;

    assert_eq!(refreshed.value(), Some(&3));
    assert!(!refreshed.metadata().served_from_cache);
    assert_eq!(cached.value(), Some(&3));
    assert!(cached.metadata().served_from_cache);
    assert_eq!(op.invocations(), 2);
}

/// Validates empty-but-successful results are flagged.
#[tokio::test(start_paused = true)]
async fn empty_value_reports_empty_status() {
    let runner = SafeCallRunner::new(ResponseCache::new());
    let op = ScriptedOperation::succeeding(Vec::<u32>::new());

    let outcome = runner.run(op.operation(), "failed", CallOptions::new()).await;

    assert!(outcome.is_success());
    assert!(outcome.is_empty());
}

/// Validates `silent()` suppresses the notifier but still fails.
#[tokio::test(start_paused = true)]
async fn silent_call_does_not_notify() {
    let notifier = RecordingNotifier::new();
    let runner = runner_with(&notifier);
    let op = ScriptedOperation::<u32>::failing(CallError::http(403, "nope"));

    let outcome = runner.run(op.operation(), "failed", CallOptions::new().silent()).await;

    assert_eq!(outcome.kind(), Some(ErrorKind::Forbidden));
    assert_eq!(notifier.count(), 0);
}

/// Validates cancellation during an attempt.
///
/// Assertions:
/// - Outcome is `Failure` with kind `cancelled`.
/// - No further attempt is made and nobody is notified.
#[tokio::test(start_paused = true)]
async fn cancellation_stops_the_call() {
    let notifier = RecordingNotifier::new();
    let runner = runner_with(&notifier);
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let counter = Arc::clone(&calls);
    let outcome = runner
        .run(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Ok::<_, CallError>("late".to_string())
                }
            },
            "failed",
            CallOptions::new().cancel_with(token),
        )
        .await;

    assert_eq!(outcome.kind(), Some(ErrorKind::Cancelled));
    assert_eq!(outcome.message(), Some("تم إلغاء الطلب."));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(notifier.count(), 0);
}

/// Validates a token cancelled up front prevents any invocation.
#[tokio::test(start_paused = true)]
async fn pre_cancelled_token_never_invokes() {
    let runner = SafeCallRunner::new(ResponseCache::new());
    let token = CancellationToken::new();
    token.cancel();
    let op = ScriptedOperation::succeeding(1u32);

    let outcome = runner.run(op.operation(), "failed", CallOptions::new().cancel_with(token)).await;

    assert_eq!(outcome.kind(), Some(ErrorKind::Cancelled));
    assert_eq!(op.invocations(), 0);
}

/// Validates cancellation while waiting between attempts.
#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff() {
    let runner = SafeCallRunner::new(ResponseCache::new());
    let token = CancellationToken::new();
    let op = ScriptedOperation::<u32>::failing(CallError::network("down"));

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });

    let outcome = runner.run(op.operation(), "failed", CallOptions::new().cancel_with(token)).await;

    assert_eq!(outcome.kind(), Some(ErrorKind::Cancelled));
    assert_eq!(op.invocations(), 1);
}

/// Validates batch outcomes keep input order and stay isolated.
///
/// Assertions:
/// - One failing member does not affect the others.
/// - The failing member carries its own message; members without one use the
///   batch default.
#[tokio::test(start_paused = true)]
async fn batch_is_isolated_and_ordered() {
    let notifier = RecordingNotifier::new();
    let runner = runner_with(&notifier);

    let operations = vec![
        NamedOperation::new("properties", || async { Ok::<_, CallError>(vec![1u32, 2]) }),
        NamedOperation::new("clients", || async { Err::<Vec<u32>, _>(CallError::http(409, "x")) })
            .with_error_message("فشل تحميل العملاء"),
        NamedOperation::new("deals", || async { Err::<Vec<u32>, _>(CallError::Other("x".into())) }),
        NamedOperation::new("agents", || async { Ok::<_, CallError>(vec![]) }),
    ];

    let outcomes = runner.run_batch(operations, CallOptions::new()).await;

    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[0].value(), Some(&vec![1, 2]));
    assert_eq!(outcomes[1].message(), Some("فشل تحميل العملاء"));
    assert_eq!(outcomes[2].message(), Some("حدث خطأ في العملية"));
    assert!(outcomes[3].is_empty());
    assert_eq!(notifier.count(), 2);
}

/// Validates batch members cache under their own scoped keys.
#[tokio::test(start_paused = true)]
async fn batch_members_cache_separately() {
    let runner = SafeCallRunner::new(ResponseCache::new());
    let batch = || {
        vec![
            NamedOperation::new("a", || async { Ok::<_, CallError>(1u32) }),
            NamedOperation::new("b", || async { Ok::<_, CallError>(2u32) }),
        ]
    };

    runner.run_batch(batch(), CallOptions::new().cached("dashboard")).await;
    let second = runner.run_batch(batch(), CallOptions::new().cached("dashboard")).await;

    assert_eq!(second[0].value(), Some(&1));
    assert_eq!(second[1].value(), Some(&2));
    assert!(second.iter().all(|o| o.metadata().served_from_cache));
    assert_eq!(runner.cache().stats().keys, vec!["dashboard:a".to_string(), "dashboard:b".to_string()]);
}

fn listing(total: u64) -> impl FnMut(u32, u32) -> std::future::Ready<Result<Page<u64>, CallError>> {
    move |page, page_size| {
        let start = u64::from(page - 1) * u64::from(page_size);
        let end = (start + u64::from(page_size)).min(total);
        let items: Vec<u64> = (start..end).collect();
        let total_pages = u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX);
        std::future::ready(Ok(Page { items, total_items: total, total_pages }))
    }
}

/// Validates a small listing is returned whole.
///
/// Assertions:
/// - 40 items with 50 per page yields all 40 items.
/// - No warning is attached.
#[tokio::test(start_paused = true)]
async fn paginated_small_listing_is_complete() {
    let runner = SafeCallRunner::new(ResponseCache::new());

    let outcome = runner.run_paginated(listing(40), PaginationOptions::default()).await;

    let result = outcome.value().unwrap();
    assert_eq!(result.items.len(), 40);
    assert_eq!(result.total_items, 40);
    assert_eq!(result.performance_warning, None);
    assert_eq!(outcome.warning(), None);
}

/// Validates a listing above the total limit still succeeds with a warning.
#[tokio::test(start_paused = true)]
async fn paginated_huge_listing_warns() {
    let runner = SafeCallRunner::new(ResponseCache::new());

    let outcome = runner
        .run_paginated(listing(5000), PaginationOptions::default().max_total_items(1000))
        .await;

    assert!(outcome.is_success());
    let warning = outcome.warning().unwrap();
    assert!(!warning.is_empty());
    assert!(warning.contains("5000"));
    assert_eq!(outcome.value().unwrap().total_items, 5000);
}

/// Validates a mid-sized listing returns the first page with the advisory.
#[tokio::test(start_paused = true)]
async fn paginated_mid_listing_advises_paging() {
    let runner = SafeCallRunner::new(ResponseCache::new()).with_locale(Locale::English);

    let outcome = runner.run_paginated(listing(300), PaginationOptions::default()).await;

    let result = outcome.value().unwrap();
    assert_eq!(result.items.len(), 10);
    assert_eq!(
        result.performance_warning.as_deref(),
        Some("Browsing page by page is recommended for better performance")
    );
}

/// Validates an empty listing is a successful empty result.
#[tokio::test(start_paused = true)]
async fn paginated_empty_listing() {
    let runner = SafeCallRunner::new(ResponseCache::new());

    let outcome = runner.run_paginated(listing(0), PaginationOptions::default()).await;

    assert!(outcome.is_empty());
    assert!(outcome.value().unwrap().items.is_empty());
}

/// Validates pagination failures use the listing default message.
#[tokio::test(start_paused = true)]
async fn paginated_failure_uses_default_message() {
    let runner = SafeCallRunner::new(ResponseCache::new()).with_notifier(|_: ErrorKind, _: &str| {});

    let outcome = runner
        .run_paginated(
            |_, _| async { Err::<Page<u64>, _>(CallError::Decode("bad json".into())) },
            PaginationOptions::default(),
        )
        .await;

    assert_eq!(outcome.kind(), Some(ErrorKind::Unknown));
    assert_eq!(outcome.message(), Some("فشل في تحميل البيانات"));
}
