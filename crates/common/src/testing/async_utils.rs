//! Async waiting helpers

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Poll `condition` every `interval` until it holds or `timeout` elapses.
///
/// Uses tokio's clock, so it cooperates with `start_paused` tests.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();

    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }

    condition().await
}
