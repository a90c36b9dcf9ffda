//! Control state for the periodic dashboard refresher.
//!
//! The refresher task and the admin API share one [`RefreshControl`]
//! behind an [`Arc`](std::sync::Arc). Atomics carry the flags the
//! refresher reads every cycle; [`Notify`] wakes it early for a forced
//! refresh or a resume.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::PollingConfig;

/// Why the refresher woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The poll interval elapsed.
    Interval,
    /// An admin asked for an immediate refresh.
    Forced,
}

/// Shared refresher control state.
#[derive(Debug)]
pub struct RefreshControl {
    paused: AtomicBool,
    resume_notify: Notify,
    refresh_notify: Notify,
    interval_ms: AtomicU64,
    min_interval_ms: u64,
    refresh_count: AtomicU64,
    failure_count: AtomicU64,
    started_at: DateTime<Utc>,
    last_refresh: Mutex<Option<DateTime<Utc>>>,
    last_error: Mutex<Option<String>>,
}

impl RefreshControl {
    /// New control state from the `polling` config section.
    pub fn new(config: &PollingConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            refresh_notify: Notify::new(),
            interval_ms: AtomicU64::new(config.interval_ms.max(config.min_interval_ms)),
            min_interval_ms: config.min_interval_ms,
            refresh_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            started_at: Utc::now(),
            last_refresh: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether refreshing is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Stop refreshing; the last snapshot keeps being served.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume refreshing and wake the refresher.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    // -----------------------------------------------------------------------
    // Interval
    // -----------------------------------------------------------------------

    /// Current poll interval in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::Acquire)
    }

    /// Smallest interval [`set_interval_ms`](Self::set_interval_ms) accepts.
    pub const fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    /// Change the poll interval. Returns the previous interval, or `None`
    /// if `ms` is below the minimum.
    pub fn set_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < self.min_interval_ms {
            return None;
        }
        Some(self.interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Waking
    // -----------------------------------------------------------------------

    /// Ask the refresher to run now instead of waiting out the interval.
    pub fn request_refresh(&self) {
        self.refresh_notify.notify_one();
    }

    /// Wait until the next refresh is due.
    ///
    /// Returns when the interval elapses or a forced refresh is requested,
    /// and never while paused. A forced refresh requested while paused
    /// still runs once the refresher is resumed.
    pub async fn wait_for_next(&self) -> Wake {
        let interval = Duration::from_millis(self.interval_ms());
        let wake = tokio::select! {
            () = tokio::time::sleep(interval) => Wake::Interval,
            () = self.refresh_notify.notified() => Wake::Forced,
        };
        while self.is_paused() {
            self.resume_notify.notified().await;
        }
        wake
    }

    // -----------------------------------------------------------------------
    // Bookkeeping
    // -----------------------------------------------------------------------

    /// Record a successful refresh at `at`.
    pub async fn record_success(&self, at: DateTime<Utc>) {
        self.refresh_count.fetch_add(1, Ordering::AcqRel);
        *self.last_refresh.lock().await = Some(at);
        *self.last_error.lock().await = None;
    }

    /// Record a failed refresh.
    pub async fn record_failure(&self, error: String) {
        self.failure_count.fetch_add(1, Ordering::AcqRel);
        *self.last_error.lock().await = Some(error);
    }

    /// When the last successful refresh finished.
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.lock().await
    }

    /// Snapshot of the control state for the admin API.
    pub async fn status(&self) -> RefreshStatus {
        RefreshStatus {
            paused: self.is_paused(),
            interval_ms: self.interval_ms(),
            min_interval_ms: self.min_interval_ms,
            refresh_count: self.refresh_count.load(Ordering::Acquire),
            failure_count: self.failure_count.load(Ordering::Acquire),
            last_refresh: self.last_refresh().await.map(|t| t.to_rfc3339()),
            last_error: self.last_error.lock().await.clone(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// JSON-serializable refresher status for the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshStatus {
    /// Whether refreshing is paused.
    pub paused: bool,
    /// Current poll interval in milliseconds.
    pub interval_ms: u64,
    /// Minimum allowed interval.
    pub min_interval_ms: u64,
    /// Successful refreshes since start.
    pub refresh_count: u64,
    /// Failed refreshes since start.
    pub failure_count: u64,
    /// RFC 3339 time of the last successful refresh.
    pub last_refresh: Option<String>,
    /// Error from the most recent failed refresh, cleared on success.
    pub last_error: Option<String>,
    /// RFC 3339 time the server started.
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn control() -> RefreshControl {
        RefreshControl::new(&PollingConfig::default())
    }

    #[test]
    fn interval_respects_minimum() {
        let control = control();
        assert_eq!(control.interval_ms(), 30_000);
        assert_eq!(control.set_interval_ms(4_999), None);
        assert_eq!(control.set_interval_ms(10_000), Some(30_000));
        assert_eq!(control.interval_ms(), 10_000);
    }

    #[test]
    fn configured_interval_below_minimum_is_raised() {
        let control = RefreshControl::new(&PollingConfig {
            interval_ms: 10,
            min_interval_ms: 5_000,
        });
        assert_eq!(control.interval_ms(), 5_000);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_wake() {
        let control = control();
        let started = tokio::time::Instant::now();
        assert_eq!(control.wait_for_next().await, Wake::Interval);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn forced_wake_skips_interval() {
        let control = Arc::new(control());
        control.request_refresh();
        let started = tokio::time::Instant::now();
        assert_eq!(control.wait_for_next().await, Wake::Forced);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn paused_refresher_waits_for_resume() {
        let control = Arc::new(control());
        control.pause();
        control.request_refresh();

        let waiter = Arc::clone(&control);
        let handle = tokio::spawn(async move { waiter.wait_for_next().await });

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!handle.is_finished());

        control.resume();
        let wake = handle.await.ok();
        assert_eq!(wake, Some(Wake::Forced));
    }

    #[tokio::test]
    async fn status_tracks_successes_and_failures() {
        let control = control();
        control.record_failure("db down".to_owned()).await;
        let status = control.status().await;
        assert_eq!(status.failure_count, 1);
        assert_eq!(status.last_error.as_deref(), Some("db down"));

        control.record_success(Utc::now()).await;
        let status = control.status().await;
        assert_eq!(status.refresh_count, 1);
        assert!(status.last_error.is_none());
        assert!(status.last_refresh.is_some());
    }
}
