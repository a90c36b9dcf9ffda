//! Admin REST API for controlling the dashboard refresher.
//!
//! These endpoints never touch simulation data; they steer how often the
//! server re-reads it. Every route requires `Authorization: Bearer <token>`
//! with a token from `POST /functions/verify-admin-password`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/admin/status` | Refresher status |
//! | `POST` | `/api/admin/refresh` | Refresh dashboards now |
//! | `POST` | `/api/admin/pause` | Pause the refresher |
//! | `POST` | `/api/admin/resume` | Resume the refresher |
//! | `POST` | `/api/admin/interval` | Set the poll interval (ms) |
//! | `POST` | `/api/admin/logout` | Revoke the presented token |

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use observatory_core::refresh::RefreshStatus;
use observatory_core::session::now_ms;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Bearer token extractor
// ---------------------------------------------------------------------------

/// A valid admin token taken from the `Authorization` header.
///
/// Use as a handler parameter to require an admin session.
#[derive(Debug, Clone)]
pub struct AdminToken(pub String);

impl FromRequestParts<Arc<AppState>> for AdminToken {
    type Rejection = ObserverError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ObserverError::Unauthorized("missing bearer token".to_owned()))?;

        if state.sessions.validate(token, now_ms()).await {
            Ok(Self(token.to_owned()))
        } else {
            Err(ObserverError::Unauthorized(
                "invalid or expired session".to_owned(),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/admin/interval`.
#[derive(Debug, serde::Deserialize)]
pub struct SetIntervalRequest {
    /// New poll interval in milliseconds.
    pub interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct AdminResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
}

impl AdminResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            ok: true,
            message: message.into(),
        })
    }
}

/// Response body for `GET /api/admin/status`.
#[derive(Debug, serde::Serialize)]
pub struct AdminStatus {
    /// Refresher state.
    pub refresh: RefreshStatus,
    /// Data source kind (`postgres` or `memory`).
    pub source: &'static str,
    /// Worlds with a cached dashboard.
    pub cached_worlds: usize,
    /// Outstanding admin tokens.
    pub active_sessions: usize,
    /// Whether simplify-text can reach an API.
    pub simplifier_configured: bool,
}

// ---------------------------------------------------------------------------
// GET /api/admin/status
// ---------------------------------------------------------------------------

/// Return refresher, cache, and session counts.
pub async fn status(
    _token: AdminToken,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let cached_worlds = state.dashboards.read().await.len();
    Ok(Json(AdminStatus {
        refresh: state.refresh.status().await,
        source: state.source.kind(),
        cached_worlds,
        active_sessions: state.sessions.len().await,
        simplifier_configured: state.simplifier.is_configured(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/admin/refresh
// ---------------------------------------------------------------------------

/// Wake the refresher immediately. While paused, the refresh runs on resume.
pub async fn refresh(
    _token: AdminToken,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    state.refresh.request_refresh();
    tracing::info!("admin requested dashboard refresh");
    Ok(AdminResponse::ok("Refresh requested"))
}

// ---------------------------------------------------------------------------
// POST /api/admin/pause
// ---------------------------------------------------------------------------

/// Pause the refresher. Cached dashboards keep being served.
pub async fn pause(
    _token: AdminToken,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    state.refresh.pause();
    tracing::info!("dashboard refresher paused");
    Ok(AdminResponse::ok("Refresher paused"))
}

// ---------------------------------------------------------------------------
// POST /api/admin/resume
// ---------------------------------------------------------------------------

/// Resume the refresher.
pub async fn resume(
    _token: AdminToken,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    state.refresh.resume();
    tracing::info!("dashboard refresher resumed");
    Ok(AdminResponse::ok("Refresher resumed"))
}

// ---------------------------------------------------------------------------
// POST /api/admin/interval
// ---------------------------------------------------------------------------

/// Change the poll interval. Takes effect after the current wait.
pub async fn set_interval(
    _token: AdminToken,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetIntervalRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let min = state.refresh.min_interval_ms();
    state.refresh.set_interval_ms(body.interval_ms).map_or_else(
        || {
            Err(ObserverError::InvalidQuery(format!(
                "interval_ms must be at least {min}"
            )))
        },
        |prev| {
            tracing::info!(previous_ms = prev, interval_ms = body.interval_ms, "poll interval changed");
            Ok(Json(serde_json::json!({
                "ok": true,
                "message": format!("Poll interval changed from {prev}ms to {}ms", body.interval_ms),
                "previous_interval_ms": prev,
                "new_interval_ms": body.interval_ms,
            })))
        },
    )
}

// ---------------------------------------------------------------------------
// POST /api/admin/logout
// ---------------------------------------------------------------------------

/// Revoke the token used for this request.
pub async fn logout(
    AdminToken(token): AdminToken,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    state.sessions.revoke(&token).await;
    Ok(AdminResponse::ok("Logged out"))
}
