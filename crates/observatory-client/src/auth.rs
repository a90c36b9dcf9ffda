//! Admin login state for a dashboard client.
//!
//! The session record lives in a [`SessionStore`] file so a login
//! survives restarts for its lifetime. Password checks are never retried.

use observatory_core::session::{AdminSession, SessionStore, now_ms};

use crate::api::{AdminAck, AdminStatus, ApiClient};
use crate::error::ClientError;

/// Admin session manager backed by a session file.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    api: ApiClient,
    store: SessionStore,
}

impl AdminAuth {
    /// Manage the session stored in `store`.
    pub const fn new(api: ApiClient, store: SessionStore) -> Self {
        Self { api, store }
    }

    /// The stored session, if still valid at `now`.
    pub fn session_at(&self, now: i64) -> Option<AdminSession> {
        self.store.load(now)
    }

    /// Whether a valid session is stored.
    pub fn is_authenticated(&self) -> bool {
        self.session_at(now_ms()).is_some()
    }

    /// Check `password` with the server and persist the session on success.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] for a wrong password, or another
    /// variant if the server could not be asked or the session file
    /// could not be written.
    pub async fn login(&self, password: &str) -> Result<AdminSession, ClientError> {
        let granted = self.api.verify_password(password).await?;
        let now = now_ms();
        let session = AdminSession {
            authenticated: true,
            expires_at: granted.expires_at.unwrap_or(now),
            token: granted.token,
        };
        if !session.is_valid(now) {
            return Err(ClientError::Unauthorized(
                "server issued an expired session".to_owned(),
            ));
        }
        self.store.save(&session)?;
        tracing::info!(expires_at = session.expires_at, "admin login succeeded");
        Ok(session)
    }

    /// Revoke the token on the server (best effort) and clear the local
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the session file could not be
    /// cleared.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Some(token) = self.session_at(now_ms()).and_then(|s| s.token) {
            if let Err(e) = self.api.admin_logout(&token).await {
                tracing::warn!(error = %e, "server-side logout failed; clearing local session anyway");
            }
        }
        self.store.clear()?;
        Ok(())
    }

    /// Refresher status, using the stored token.
    pub async fn status(&self) -> Result<AdminStatus, ClientError> {
        let token = self.token()?;
        let result = self.api.admin_status(&token).await;
        self.forget_on_auth_failure(result)
    }

    /// Force a dashboard refresh.
    pub async fn refresh(&self) -> Result<AdminAck, ClientError> {
        let token = self.token()?;
        let result = self.api.admin_refresh(&token).await;
        self.forget_on_auth_failure(result)
    }

    /// Pause the refresher.
    pub async fn pause(&self) -> Result<AdminAck, ClientError> {
        let token = self.token()?;
        let result = self.api.admin_pause(&token).await;
        self.forget_on_auth_failure(result)
    }

    /// Resume the refresher.
    pub async fn resume(&self) -> Result<AdminAck, ClientError> {
        let token = self.token()?;
        let result = self.api.admin_resume(&token).await;
        self.forget_on_auth_failure(result)
    }

    /// Change the refresher interval.
    pub async fn set_interval(&self, interval_ms: u64) -> Result<(), ClientError> {
        let token = self.token()?;
        let result = self.api.admin_set_interval(&token, interval_ms).await;
        self.forget_on_auth_failure(result)
    }

    fn token(&self) -> Result<String, ClientError> {
        self.session_at(now_ms())
            .and_then(|s| s.token)
            .ok_or(ClientError::NotLoggedIn)
    }

    /// A 401 means the server no longer knows the token, so drop it locally.
    fn forget_on_auth_failure<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(ClientError::Unauthorized(reason)) = &result {
            tracing::info!(reason = %reason, "admin session rejected; clearing local session");
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "failed to clear admin session");
            }
        }
        result
    }
}
