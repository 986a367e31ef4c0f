use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::elements::cache::{ElementCache, ElementSnapshot};
use crate::elements::error::FetchError;
use crate::elements::source::ElementSource;

#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// Delay between successful fetches.
    pub interval: Duration,
    pub fetch_timeout: Duration,
    /// First retry delay after a failure; doubles per consecutive failure.
    pub retry_initial: Duration,
    pub retry_max: Duration,
}

pub struct RefreshHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl RefreshHandle {
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.join.await;
    }
}

/// Fetch once and publish on success. On failure the cache keeps whatever it held.
pub async fn refresh_once<S: ElementSource>(
    source: &S,
    cache: &ElementCache,
    timeout: Duration,
) -> Result<Arc<ElementSnapshot>, FetchError> {
    let elements = tokio::time::timeout(timeout, source.fetch_latest())
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;
    Ok(cache.publish(elements, Utc::now()))
}

/// Exponential backoff for the `attempt`-th consecutive failure (1-based).
pub fn backoff_delay(attempt: u32, initial: Duration, max: Duration) -> Duration {
    let factor = 1u32
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    initial.checked_mul(factor).map_or(max, |d| d.min(max))
}

/// Start the background task that owns all writes to `cache`.
pub fn spawn_refresh<S: ElementSource>(
    source: S,
    cache: ElementCache,
    policy: RefreshPolicy,
) -> RefreshHandle {
    let (stop_tx, stop_rx) = oneshot::channel();
    let join = tokio::spawn(run_refresh_loop(source, cache, policy, stop_rx));
    RefreshHandle { stop_tx, join }
}

async fn run_refresh_loop<S: ElementSource>(
    source: S,
    cache: ElementCache,
    policy: RefreshPolicy,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut failures: u32 = 0;
    log::info!("Element refresh started from {}", source.describe());

    loop {
        let delay = match refresh_once(&source, &cache, policy.fetch_timeout).await {
            Ok(snapshot) => {
                failures = 0;
                log::info!(
                    "Loaded elements for {} (epoch {})",
                    snapshot.elements.name().unwrap_or("unnamed object"),
                    snapshot.elements.epoch()
                );
                policy.interval
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = backoff_delay(failures, policy.retry_initial, policy.retry_max);
                log::warn!(
                    "Element fetch from {} failed (attempt {}): {}; retrying in {:?}",
                    source.describe(),
                    failures,
                    e,
                    delay
                );
                match cache.current() {
                    Some(snapshot) if cache.freshness(&snapshot, Utc::now()).stale => {
                        log::error!(
                            "Serving stale elements fetched at {}",
                            snapshot.fetched_at
                        );
                    }
                    Some(_) => {}
                    None => log::warn!("No element set loaded yet"),
                }
                delay
            }
        };

        let should_stop = tokio::select! {
            _ = sleep(delay) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            break;
        }
    }

    log::info!("Element refresh stopped");
}
