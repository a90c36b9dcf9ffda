//! Axum router construction for the Observatory API.
//!
//! Assembles the read API, the admin API, and the two backend functions
//! into a single [`Router`] with CORS enabled for the dashboard.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{admin, functions, handlers};

/// Build the complete Axum router for the Observatory server.
///
/// See [`handlers`], [`admin`], and [`functions`] for the endpoint
/// tables. CORS allows any origin; the dashboard is served from a
/// different host than the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Read API
        .route("/api/health", get(handlers::health))
        .route("/api/worlds", get(handlers::list_worlds))
        .route("/api/worlds/{id}", get(handlers::get_world))
        .route("/api/worlds/{id}/events", get(handlers::list_events))
        .route("/api/worlds/{id}/agents", get(handlers::list_agents))
        .route(
            "/api/worlds/{id}/agents/{agent_id}/events",
            get(handlers::list_agent_events),
        )
        .route("/api/worlds/{id}/artifacts", get(handlers::list_artifacts))
        .route("/api/worlds/{id}/eras", get(handlers::list_eras))
        .route("/api/worlds/{id}/briefings", get(handlers::list_briefings))
        .route("/api/worlds/{id}/quotes", get(handlers::list_quotes))
        .route("/api/worlds/{id}/mood", get(handlers::get_mood))
        .route("/api/worlds/{id}/leaderboard", get(handlers::get_leaderboard))
        .route("/api/worlds/{id}/dashboard", get(handlers::get_dashboard))
        .route("/api/worlds/{id}/tension", get(handlers::get_tension))
        .route(
            "/api/worlds/{id}/share/{kind}",
            get(handlers::get_share_card),
        )
        // Backend functions
        .route(
            "/functions/verify-admin-password",
            post(functions::admin_auth::verify_admin_password),
        )
        .route(
            "/functions/simplify-text",
            post(functions::simplify::simplify_text),
        )
        // Admin API
        .route("/api/admin/status", get(admin::status))
        .route("/api/admin/refresh", post(admin::refresh))
        .route("/api/admin/pause", post(admin::pause))
        .route("/api/admin/resume", post(admin::resume))
        .route("/api/admin/interval", post(admin::set_interval))
        .route("/api/admin/logout", post(admin::logout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
