//! Integration tests for the notification service driven by the poller.
//!
//! A wiremock server stands in for the Balance API. The poller and the
//! service share one readiness gate, so the tests observe how backend
//! availability discovered by polling changes what request paths return.

use std::sync::Arc;
use std::time::Duration;

use balance_common::testing::{poll_until, RecordingNotifier};
use balance_common::{
    ErrorKind, GateState, NotificationPoller, ResponseCache, RetryPolicy, SafeCallRunner,
    SuccessStatus, TickAction,
};
use balance_domain::NotificationFilters;
use balance_infra::{ApiClient, NotificationService};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    cache: ResponseCache,
    notifier: RecordingNotifier,
    service: Arc<NotificationService>,
    poller: NotificationPoller<NotificationService>,
}

impl Harness {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let cache = ResponseCache::new();
        let notifier = RecordingNotifier::new();

        let client = ApiClient::builder().base_url(server.uri()).build().expect("client builds");
        let policy = RetryPolicy::builder()
            .base_delay(Duration::from_millis(10))
            .build()
            .expect("policy is valid");
        let runner = SafeCallRunner::new(cache.clone())
            .with_policy(policy)
            .with_notifier(notifier.clone());

        let service = Arc::new(NotificationService::new(client, runner));
        let poller = NotificationPoller::with_gate(
            Arc::clone(&service),
            service.gate(),
            Duration::from_secs(120),
        );

        Self { server, cache, notifier, service, poller }
    }

    async fn mount_unread(&self, count: u64) {
        Mock::given(method("GET"))
            .and(path("/api/Notification/unread-count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": count })))
            .mount(&self.server)
            .await;
    }

    async fn mount_list(&self, ids: &[i64]) {
        Mock::given(method("GET"))
            .and(path("/api/Notification"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(ids)))
            .mount(&self.server)
            .await;
    }

    async fn requests_to(&self, endpoint: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == endpoint)
            .count()
    }
}

fn page_json(ids: &[i64]) -> serde_json::Value {
    let items: Vec<_> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "userId": "agent-7",
                "type": "assignment",
                "title": "تم تعيين عميل جديد",
                "message": "Client assigned to you",
                "data": { "projectId": 12, "unitId": 304 },
                "isRead": false,
                "createdAt": "2026-10-18T08:30:00Z"
            })
        })
        .collect();
    json!({
        "items": items,
        "totalItems": ids.len(),
        "totalPages": 1,
        "currentPage": 1,
        "pageSize": 20,
        "hasNextPage": false,
        "hasPreviousPage": false
    })
}

/// Validates a backend without the notifications feature is detected once
/// and then left alone.
///
/// Assertions:
/// - A 404 probe moves the shared gate straight to `NotReady` with no
///   user-facing error and no toast.
/// - Service reads and commands answer locally afterwards.
/// - Later ticks skip without any request.
#[tokio::test]
async fn missing_feature_is_detected_and_answered_locally() {
    let harness = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/api/Notification/unread-count"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&harness.server)
        .await;

    assert_eq!(harness.poller.poll_once().await, TickAction::Probe);
    let snapshot = harness.poller.snapshot();
    assert_eq!(snapshot.state, GateState::NotReady);
    assert_eq!(snapshot.last_error, None);
    assert_eq!(harness.notifier.count(), 0);

    assert!(!harness.service.is_available());
    let page = harness.service.list(&NotificationFilters::default()).await;
    assert_eq!(page.status(), Some(SuccessStatus::Empty));
    let ack = harness.service.mark_as_read(1).await;
    assert_eq!(
        ack.value().and_then(|response| response.message.as_deref()),
        Some("تم وضع علامة قراءة محلياً")
    );

    assert_eq!(harness.poller.poll_once().await, TickAction::Skip);
    assert_eq!(harness.server.received_requests().await.unwrap_or_default().len(), 1);
}

/// Validates the healthy path: probe, load, then refresh only on growth.
///
/// Assertions:
/// - A successful probe makes the gate `Ready` and loads the list.
/// - An unchanged count does not refetch the list.
/// - A higher count refetches the list.
#[tokio::test]
async fn ready_backend_refreshes_list_when_count_grows() {
    let harness = Harness::new().await;
    harness.mount_unread(2).await;
    harness.mount_list(&[1, 2]).await;

    assert_eq!(harness.poller.poll_once().await, TickAction::Probe);
    let snapshot = harness.poller.snapshot();
    assert_eq!(snapshot.state, GateState::Ready);
    assert_eq!(snapshot.unread_count, 2);
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.items[0].data.as_ref().and_then(|d| d.unit_id), Some(304));

    assert_eq!(harness.poller.poll_once().await, TickAction::Poll);
    assert_eq!(harness.requests_to("/api/Notification").await, 1);

    harness.server.reset().await;
    harness.mount_unread(3).await;
    harness.mount_list(&[1, 2, 3]).await;

    assert_eq!(harness.poller.poll_once().await, TickAction::Poll);
    let snapshot = harness.poller.snapshot();
    assert_eq!(snapshot.unread_count, 3);
    assert_eq!(snapshot.items.len(), 3);
}

/// Validates a dashboard listing loaded moments earlier does not mask a new
/// notification from the poller.
///
/// Assertions:
/// - After the request path caches two items, a grown count makes the next
///   tick fetch the list from the server.
/// - The snapshot and the request path both see the third item.
#[tokio::test]
async fn poll_refresh_ignores_listing_cached_by_dashboard() {
    let harness = Harness::new().await;
    harness.mount_unread(2).await;
    harness.mount_list(&[1, 2]).await;

    assert_eq!(harness.poller.poll_once().await, TickAction::Probe);
    let page = harness.service.list(&NotificationFilters::default()).await;
    assert_eq!(page.value().map(|p| p.items.len()), Some(2));

    harness.server.reset().await;
    harness.mount_unread(3).await;
    harness.mount_list(&[1, 2, 3]).await;

    assert_eq!(harness.poller.poll_once().await, TickAction::Poll);
    let snapshot = harness.poller.snapshot();
    assert_eq!(snapshot.unread_count, 3);
    assert_eq!(snapshot.items.len(), 3);
    assert_eq!(harness.requests_to("/api/Notification").await, 1);

    let page = harness.service.list(&NotificationFilters::default()).await;
    assert_eq!(page.value().map(|p| p.items.len()), Some(3));
}

/// Validates transient outages suspend polling after three probes and that
/// resetting the backend status recovers.
///
/// Assertions:
/// - Each probe retries once, so three probes make six requests.
/// - The snapshot carries the localized server error, with no toast.
/// - `reset_backend_status` returns the gate to `Checking` and the next
///   tick reaches `Ready`.
#[tokio::test]
async fn transient_outage_suspends_until_reset() {
    let harness = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/api/Notification/unread-count"))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .named("unread-count outage")
        .mount(&harness.server)
        .await;

    for _ in 0..3 {
        assert_eq!(harness.poller.poll_once().await, TickAction::Probe);
    }
    let snapshot = harness.poller.snapshot();
    assert_eq!(snapshot.state, GateState::NotReady);
    assert_eq!(snapshot.last_error.as_deref(), Some("خطأ في الخادم. يرجى المحاولة لاحقاً."));
    assert_eq!(harness.notifier.count(), 0);
    harness.server.verify().await;

    harness.server.reset().await;
    harness.mount_unread(0).await;
    harness.mount_list(&[]).await;

    harness.service.reset_backend_status();
    assert_eq!(harness.service.gate().state(), GateState::Checking);
    assert_eq!(harness.poller.poll_once().await, TickAction::Probe);
    assert_eq!(harness.poller.snapshot().state, GateState::Ready);
}

/// Validates commands carry the bearer token, retry once and report the
/// service's own message.
#[tokio::test]
async fn commands_use_token_and_notify_on_failure() {
    let harness = Harness::new().await;
    Mock::given(method("PUT"))
        .and(path("/api/Notification/mark-all-read"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "All notifications marked as read"
        })))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/Notification/bulk-delete"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&harness.server)
        .await;

    let client = ApiClient::builder()
        .base_url(harness.server.uri())
        .auth_token("session-token")
        .build()
        .expect("client builds");
    let policy = RetryPolicy::builder()
        .base_delay(Duration::from_millis(10))
        .build()
        .expect("policy is valid");
    let runner = SafeCallRunner::new(harness.cache.clone())
        .with_policy(policy)
        .with_notifier(harness.notifier.clone());
    let service = NotificationService::new(client, runner).with_gate(harness.service.gate());

    let ack = service.mark_all_as_read().await;
    assert_eq!(
        ack.value().and_then(|response| response.message.as_deref()),
        Some("All notifications marked as read")
    );

    let failed = service.delete_many(&[4, 5]).await;
    assert_eq!(failed.kind(), Some(ErrorKind::Server));
    assert_eq!(failed.metadata().retry_count, 1);
    assert_eq!(harness.notifier.count(), 1);
}

/// Validates the background loop drives the shared gate.
///
/// Assertions:
/// - The first tick runs right after `start`.
/// - `stop` ends the loop.
#[tokio::test]
async fn background_poller_reaches_ready() {
    let mut harness = Harness::new().await;
    harness.mount_unread(1).await;
    harness.mount_list(&[9]).await;

    harness.poller.start().await.expect("poller starts");
    let service = Arc::clone(&harness.service);
    let ready = poll_until(Duration::from_secs(5), Duration::from_millis(20), || {
        let service = Arc::clone(&service);
        async move { service.gate().is_ready() }
    })
    .await;
    assert!(ready, "gate should become ready after the first tick");
    assert_eq!(harness.poller.snapshot().items.len(), 1);

    harness.poller.stop().await.expect("poller stops");
    assert!(!harness.poller.is_running());
}
