//! `POST /functions/verify-admin-password`: the single admin password gate.
//!
//! A correct password yields a bearer token from the
//! [`SessionRegistry`](crate::sessions::SessionRegistry) valid for the
//! configured session lifetime. Nothing here retries.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use observatory_core::session::{now_ms, session_duration_ms};
use observatory_types::{VerifyPasswordRequest, VerifyPasswordResponse};

use crate::sessions::constant_time_eq;
use crate::state::AppState;

/// Reply when no admin password is configured.
pub const NOT_CONFIGURED: &str = "Admin password not configured";

/// Reply for a wrong password.
pub const INVALID_PASSWORD: &str = "Invalid password";

/// Handle `POST /functions/verify-admin-password`.
pub async fn verify_admin_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyPasswordRequest>,
) -> Response {
    let Some(expected) = state.admin.password.as_deref().filter(|p| !p.is_empty()) else {
        tracing::error!("admin password check attempted without ADMIN_PASSWORD set");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(VerifyPasswordResponse::denied(NOT_CONFIGURED)),
        )
            .into_response();
    };

    if !constant_time_eq(&body.password, expected) {
        tracing::warn!("admin password rejected");
        return (
            StatusCode::UNAUTHORIZED,
            Json(VerifyPasswordResponse::denied(INVALID_PASSWORD)),
        )
            .into_response();
    }

    let issued = state
        .sessions
        .issue(now_ms(), session_duration_ms(state.admin.session_hours))
        .await;
    tracing::info!(expires_at = issued.expires_at, "admin session issued");

    Json(VerifyPasswordResponse::granted(issued.token, issued.expires_at)).into_response()
}
