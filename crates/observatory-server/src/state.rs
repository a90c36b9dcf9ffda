//! Shared application state for the Observatory API server.
//!
//! [`AppState`] holds the data source the handlers query, the cache of
//! [`DashboardSnapshot`]s the refresher maintains, and the admin plumbing
//! (refresh control and session registry). Cached dashboards are swapped
//! in whole under a short write lock, so a reader always sees one
//! complete refresh.

use std::collections::BTreeMap;
use std::sync::Arc;

use observatory_core::config::{AdminConfig, ObservatoryConfig};
use observatory_core::dashboard::DashboardSnapshot;
use observatory_core::refresh::RefreshControl;
use observatory_core::retry::RetryPolicy;
use observatory_db::DataSource;
use observatory_types::WorldId;
use tokio::sync::RwLock;

use crate::functions::simplify::Simplifier;
use crate::sessions::SessionRegistry;

/// Dashboards keyed by world, replaced wholesale by each refresh.
pub type DashboardCache = BTreeMap<WorldId, DashboardSnapshot>;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Where records are read from.
    pub source: DataSource,
    /// Latest dashboard per world.
    pub dashboards: RwLock<DashboardCache>,
    /// Refresher control shared with the admin API.
    pub refresh: Arc<RefreshControl>,
    /// Outstanding admin tokens.
    pub sessions: SessionRegistry,
    /// Admin password and session lifetime.
    pub admin: AdminConfig,
    /// Retry policy for data source reads.
    pub retry: RetryPolicy,
    /// Text simplification client.
    pub simplifier: Simplifier,
    /// Base URL share cards link back to.
    pub public_url: String,
    /// World the dashboard opens on when the client has no preference.
    pub default_world_id: Option<WorldId>,
}

impl AppState {
    /// Build state from the loaded configuration.
    pub fn new(source: DataSource, config: &ObservatoryConfig) -> Self {
        Self {
            source,
            dashboards: RwLock::new(DashboardCache::new()),
            refresh: Arc::new(RefreshControl::new(&config.polling)),
            sessions: SessionRegistry::new(),
            admin: config.admin.clone(),
            retry: RetryPolicy::from_config(&config.retry),
            simplifier: Simplifier::from_config(&config.llm),
            public_url: config.server.public_url.clone(),
            default_world_id: parse_default_world(config.server.default_world_id.as_deref()),
        }
    }

    /// The cached dashboard for one world.
    pub async fn dashboard(&self, world_id: WorldId) -> Option<DashboardSnapshot> {
        self.dashboards.read().await.get(&world_id).cloned()
    }

    /// Replace the whole dashboard cache.
    pub async fn replace_dashboards(&self, dashboards: DashboardCache) {
        *self.dashboards.write().await = dashboards;
    }
}

fn parse_default_world(raw: Option<&str>) -> Option<WorldId> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<WorldId>() {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "ignoring invalid default_world_id");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_world_accepts_uuid_and_ignores_garbage() {
        let id = WorldId::new();
        assert_eq!(parse_default_world(Some(&id.to_string())), Some(id));
        assert_eq!(parse_default_world(Some("  ")), None);
        assert_eq!(parse_default_world(Some("not-a-uuid")), None);
        assert_eq!(parse_default_world(None), None);
    }
}
