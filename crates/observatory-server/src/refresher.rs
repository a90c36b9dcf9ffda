//! Background task that keeps the dashboard cache current.
//!
//! Each cycle lists the worlds, builds a [`DashboardSnapshot`] for every
//! one concurrently, and swaps the whole cache in at once. A world whose
//! reads fail keeps its previous snapshot; the failure is logged and
//! recorded without holding back the other worlds. If the world list
//! itself cannot be read the previous cache keeps being served.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use observatory_core::dashboard::{
    ACTIVITY_EVENT_WINDOW, DashboardInputs, DashboardSnapshot, POPULATION_HISTORY_TURNS,
};
use observatory_core::refresh::Wake;
use observatory_core::retry::retry;
use observatory_db::{DataSource, DbError};
use observatory_types::{World, WorldId};
use tokio::task::JoinHandle;

use crate::state::{AppState, DashboardCache};

/// Fetch everything one world's dashboard needs.
///
/// # Errors
///
/// Returns the first [`DbError`] any read produced.
pub async fn fetch_inputs(source: &DataSource, world: World) -> Result<DashboardInputs, DbError> {
    let id = world.id;
    let since = Utc::now()
        .checked_sub_signed(ChronoDuration::hours(24))
        .unwrap_or_default();

    let (recent_events, agents, eras, population, mood, briefings, events_last_day) = tokio::try_join!(
        source.recent_events(id, ACTIVITY_EVENT_WINDOW),
        source.agents(id, None),
        source.eras(id),
        source.population_history(id, POPULATION_HISTORY_TURNS),
        source.latest_mood(id),
        source.briefings(id, 1),
        source.count_events_since(id, since),
    )?;

    Ok(DashboardInputs {
        world,
        recent_events,
        agents,
        eras,
        population,
        mood,
        latest_briefing: briefings.into_iter().next(),
        events_last_day,
    })
}

/// Outcome of one rebuild across every world.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// The cache to install: fresh snapshots, plus the previous snapshot
    /// of any world that failed.
    pub dashboards: DashboardCache,
    /// Worlds whose reads failed this cycle.
    pub failures: Vec<(WorldId, DbError)>,
}

/// Rebuild every world's dashboard once.
///
/// # Errors
///
/// Returns a [`DbError`] only if the world list cannot be read after
/// retries. Per-world failures are reported in [`RefreshReport::failures`].
pub async fn build_dashboards(state: &AppState) -> Result<RefreshReport, DbError> {
    build_dashboards_with(state, move |world| fetch_inputs(&state.source, world)).await
}

async fn build_dashboards_with<F, Fut>(state: &AppState, fetch: F) -> Result<RefreshReport, DbError>
where
    F: Fn(World) -> Fut,
    Fut: Future<Output = Result<DashboardInputs, DbError>>,
{
    let worlds = retry(state.retry, DbError::is_transient, || state.source.worlds()).await?;

    let fetch = &fetch;
    let builds = worlds.into_iter().map(|world| async move {
        let id = world.id;
        let inputs = retry(state.retry, DbError::is_transient, || fetch(world.clone())).await;
        (id, inputs.map(|i| DashboardSnapshot::assemble(i, Utc::now())))
    });
    let results = join_all(builds).await;

    let previous = state.dashboards.read().await;
    let mut report = RefreshReport::default();
    for (id, result) in results {
        match result {
            Ok(snapshot) => {
                report.dashboards.insert(id, snapshot);
            }
            Err(e) => {
                tracing::warn!(world_id = %id, error = %e, "world dashboard refresh failed");
                if let Some(stale) = previous.get(&id) {
                    report.dashboards.insert(id, stale.clone());
                }
                report.failures.push((id, e));
            }
        }
    }
    drop(previous);
    Ok(report)
}

/// Run one refresh cycle and record its outcome.
pub async fn refresh_once(state: &AppState) {
    let result = build_dashboards(state).await;
    record_cycle(state, result).await;
}

async fn record_cycle(state: &AppState, result: Result<RefreshReport, DbError>) {
    match result {
        Ok(report) => {
            let count = report.dashboards.len();
            state.replace_dashboards(report.dashboards).await;
            state.refresh.record_success(Utc::now()).await;
            if !report.failures.is_empty() {
                let detail = report
                    .failures
                    .iter()
                    .map(|(id, e)| format!("world {id}: {e}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                state.refresh.record_failure(detail).await;
            }
            tracing::debug!(count, failed = report.failures.len(), "dashboards refreshed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "dashboard refresh failed; keeping previous snapshot");
            state.refresh.record_failure(e.to_string()).await;
        }
    }
}

/// Spawn the refresher loop on a background task.
///
/// Refreshes immediately, then whenever [`RefreshControl`] says the next
/// refresh is due. Abort the returned handle to stop it.
///
/// [`RefreshControl`]: observatory_core::refresh::RefreshControl
pub fn spawn_refresher(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            interval_ms = state.refresh.interval_ms(),
            source = state.source.kind(),
            "dashboard refresher started"
        );
        loop {
            refresh_once(&state).await;
            if state.refresh.wait_for_next().await == Wake::Forced {
                tracing::debug!("forced refresh");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use observatory_core::config::ObservatoryConfig;
    use observatory_db::MemoryStore;
    use observatory_types::{UnknownVariant, WorldStatus};

    use super::*;

    fn world(name: &str) -> World {
        World {
            id: WorldId::new(),
            name: name.to_owned(),
            current_turn: 3,
            population: 0,
            status: WorldStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn refresh_builds_one_dashboard_per_world() {
        let store = MemoryStore::new();
        let a = world("Ashfall");
        let b = world("Brine");
        store.put_world(a.clone()).await;
        store.put_world(b.clone()).await;

        let state = AppState::new(DataSource::Memory(store), &ObservatoryConfig::default());
        refresh_once(&state).await;

        assert!(state.dashboard(a.id).await.is_some());
        assert_eq!(state.dashboard(b.id).await.map(|d| d.world.name), Some("Brine".to_owned()));
        let status = state.refresh.status().await;
        assert_eq!(status.refresh_count, 1);
        assert!(status.last_refresh.is_some());
    }

    #[tokio::test]
    async fn refresh_drops_worlds_that_disappeared() {
        let store = MemoryStore::new();
        let state = AppState::new(DataSource::Memory(store), &ObservatoryConfig::default());
        let stale = world("Gone");
        let mut cache = DashboardCache::new();
        cache.insert(
            stale.id,
            DashboardSnapshot::assemble(
                DashboardInputs {
                    world: stale.clone(),
                    recent_events: Vec::new(),
                    agents: Vec::new(),
                    eras: Vec::new(),
                    population: Vec::new(),
                    mood: None,
                    latest_briefing: None,
                    events_last_day: 0,
                },
                Utc::now(),
            ),
        );
        state.replace_dashboards(cache).await;

        refresh_once(&state).await;
        assert!(state.dashboard(stale.id).await.is_none());
    }

    #[tokio::test]
    async fn one_failing_world_does_not_stall_the_others() {
        let store = MemoryStore::new();
        let good = world("Ashfall");
        let bad = world("Brine");
        store.put_world(good.clone()).await;
        store.put_world(bad.clone()).await;
        let state = AppState::new(DataSource::Memory(store.clone()), &ObservatoryConfig::default());

        refresh_once(&state).await;
        let earlier = state.dashboard(bad.id).await.map(|d| d.refreshed_at);
        assert!(earlier.is_some());

        let mut renamed = good.clone();
        renamed.name = "Ashfall Reborn".to_owned();
        store.put_world(renamed).await;

        let bad_id = bad.id;
        let source = &state.source;
        let result = build_dashboards_with(&state, move |world| async move {
            if world.id == bad_id {
                Err(DbError::UnknownTag(UnknownVariant {
                    kind: "event type",
                    value: "meteor".to_owned(),
                }))
            } else {
                fetch_inputs(source, world).await
            }
        })
        .await;
        record_cycle(&state, result).await;

        assert_eq!(
            state.dashboard(good.id).await.map(|d| d.world.name),
            Some("Ashfall Reborn".to_owned())
        );
        assert_eq!(state.dashboard(bad.id).await.map(|d| d.refreshed_at), earlier);

        let status = state.refresh.status().await;
        assert_eq!(status.refresh_count, 2);
        assert_eq!(status.failure_count, 1);
        assert!(status.last_error.is_some_and(|e| e.contains("meteor")));
    }
}
