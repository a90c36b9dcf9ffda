//! Background polling of dashboard stats.
//!
//! A [`StatsPoller`] runs one fetch per tick of a `tokio::time::interval`
//! and publishes each success through a `watch` channel, so readers
//! always see the most recent completed fetch. Failures keep the previous
//! value. Dropping the poller stops the task.

use std::future::Future;
use std::time::Duration;

use observatory_core::dashboard::DashboardSnapshot;
use observatory_core::retry::{RetryPolicy, retry};
use observatory_types::WorldId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::ApiClient;
use crate::error::ClientError;

/// How often dashboard stats are re-fetched.
pub const STATS_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct StatsPoller<T> {
    latest: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T> StatsPoller<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Call `fetch` immediately and then every `period`.
    pub fn spawn<F, Fut>(period: Duration, mut fetch: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send,
    {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match fetch().await {
                    Ok(value) => {
                        if tx.send(Some(value)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stats poll failed; keeping last value");
                    }
                }
            }
        });
        Self { latest: rx, task }
    }

    /// The most recent successful fetch.
    pub fn latest(&self) -> Option<T> {
        self.latest.borrow().clone()
    }

    /// Wait for the next successful fetch and return it.
    ///
    /// Returns `None` if the poll loop has stopped.
    pub async fn changed(&mut self) -> Option<T> {
        self.latest.changed().await.ok()?;
        self.latest.borrow_and_update().clone()
    }
}

impl StatsPoller<DashboardSnapshot> {
    /// Poll one world's dashboard every [`STATS_POLL_INTERVAL`].
    pub fn dashboard(api: ApiClient, world_id: WorldId, policy: RetryPolicy) -> Self {
        Self::dashboard_every(api, world_id, policy, STATS_POLL_INTERVAL)
    }

    /// Poll one world's dashboard every `period`.
    pub fn dashboard_every(
        api: ApiClient,
        world_id: WorldId,
        policy: RetryPolicy,
        period: Duration,
    ) -> Self {
        Self::spawn(period, move || {
            let api = api.clone();
            async move {
                retry(policy, ClientError::is_retryable, || api.dashboard(world_id)).await
            }
        })
    }
}

impl<T> Drop for StatsPoller<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn counting_fetch(
        calls: &Arc<AtomicU32>,
        fail_on: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, ClientError>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n == fail_on {
                Err(ClientError::NotLoggedIn)
            } else {
                Ok(n)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_previous_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut poller = StatsPoller::spawn(STATS_POLL_INTERVAL, counting_fetch(&calls, 1));

        assert_eq!(poller.changed().await, Some(0));
        let first = tokio::time::Instant::now();

        // The second tick fails; the third succeeds 60 s after the first.
        assert_eq!(poller.changed().await, Some(2));
        assert!(first.elapsed() >= Duration::from_secs(60));
        assert_eq!(poller.latest(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_fetching() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut poller = StatsPoller::spawn(STATS_POLL_INTERVAL, counting_fetch(&calls, u32::MAX));
        assert_eq!(poller.changed().await, Some(0));
        drop(poller);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn latest_is_empty_before_first_fetch() {
        let calls = Arc::new(AtomicU32::new(0));
        let poller = StatsPoller::spawn(STATS_POLL_INTERVAL, counting_fetch(&calls, 0));
        assert_eq!(poller.latest(), None);
    }
}
