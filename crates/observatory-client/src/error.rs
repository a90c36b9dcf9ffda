//! Error type for Observatory API calls.

use observatory_core::session::SessionError;
use reqwest::StatusCode;

/// Errors returned by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never got a response, or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the credentials or token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server returned another non-success status.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the body, or the raw body.
        message: String,
    },

    /// A success body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The local session file could not be written.
    #[error("session storage error: {0}")]
    Session(#[from] SessionError),

    /// An admin call was made without a stored session.
    #[error("not logged in")]
    NotLoggedIn,
}

impl ClientError {
    /// Whether retrying the same call could succeed.
    ///
    /// Transport failures, 5xx, and 429 are retryable. Authentication
    /// failures and other 4xx never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode() && !e.is_builder(),
            Self::Server { status, .. } => {
                *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            Self::Unauthorized(_)
            | Self::NotFound(_)
            | Self::Decode(_)
            | Self::Session(_)
            | Self::NotLoggedIn => false,
        }
    }

    /// Whether the failure means the admin session is no longer usable.
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::NotLoggedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_never_retried() {
        assert!(!ClientError::Unauthorized("Invalid password".to_owned()).is_retryable());
        assert!(!ClientError::NotLoggedIn.is_retryable());
        assert!(ClientError::NotLoggedIn.is_auth());
    }

    #[test]
    fn server_errors_retry_by_status() {
        let unavailable = ClientError::Server {
            status: 503,
            message: "database unavailable".to_owned(),
        };
        let bad_request = ClientError::Server {
            status: 400,
            message: "bad cursor".to_owned(),
        };
        let throttled = ClientError::Server {
            status: 429,
            message: String::new(),
        };
        assert!(unavailable.is_retryable());
        assert!(throttled.is_retryable());
        assert!(!bad_request.is_retryable());
    }
}
