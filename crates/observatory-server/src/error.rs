//! Error types for the Observatory API server.
//!
//! [`ObserverError`] unifies all failure modes of the read and admin APIs
//! into a single enum that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The
//! backend functions use their own response shapes (see
//! [`functions`](crate::functions)).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use observatory_db::DbError;

/// Errors that can occur in the Observatory API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The request lacked a valid admin session token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The data source failed.
    #[error("database error: {0}")]
    Database(#[from] DbError),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidQuery(msg) | Self::InvalidUuid(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Database(e) => {
                tracing::warn!(error = %e, "data source request failed");
                if e.is_transient() {
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "database unavailable".to_owned(),
                    )
                } else {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "database error".to_owned(),
                    )
                }
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
