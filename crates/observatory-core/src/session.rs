//! Admin session record and its local persistence.
//!
//! The dashboard remembers a successful password check as a single record:
//! an `authenticated` flag, an expiry in epoch milliseconds, and the token
//! the server issued. [`SessionStore`] keeps that record in a small JSON
//! file, the same way a browser keeps it in local storage under
//! [`SESSION_KEY`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Storage key for the admin session record.
pub const SESSION_KEY: &str = "observatory_admin_session";

/// Default session lifetime in hours.
pub const SESSION_HOURS: u32 = 24;

/// Milliseconds per hour.
const MS_PER_HOUR: i64 = 3_600_000;

/// Errors raised while persisting the session record.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The storage file could not be read or written.
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Session lifetime for `hours` in milliseconds.
pub fn session_duration_ms(hours: u32) -> i64 {
    i64::from(hours).saturating_mul(MS_PER_HOUR)
}

/// The persisted admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    /// Whether the password check succeeded.
    pub authenticated: bool,
    /// Expiry in epoch milliseconds.
    pub expires_at: i64,
    /// Bearer token for the admin API, when the server issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AdminSession {
    /// A fresh authenticated session valid for `duration_ms` from `now`.
    pub const fn start(now: i64, duration_ms: i64, token: Option<String>) -> Self {
        Self {
            authenticated: true,
            expires_at: now.saturating_add(duration_ms),
            token,
        }
    }

    /// Whether the session is usable at `now`. Flips exactly at `expires_at`.
    pub const fn is_valid(&self, now: i64) -> bool {
        self.authenticated && now < self.expires_at
    }

    /// Milliseconds left at `now`, or zero once expired.
    pub const fn remaining_ms(&self, now: i64) -> i64 {
        if self.is_valid(now) {
            self.expires_at.saturating_sub(now)
        } else {
            0
        }
    }
}

/// File-backed key/value store holding the admin session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by the JSON file at `path`. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session if one is stored and still valid at `now`.
    ///
    /// A missing or corrupted record reads as "not authenticated". An
    /// expired record is removed from storage.
    pub fn load(&self, now: i64) -> Option<AdminSession> {
        let mut entries = self.read_entries();
        let raw = entries.remove(SESSION_KEY)?;
        let session = match serde_json::from_value::<AdminSession>(raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupted admin session");
                self.clear_quietly();
                return None;
            }
        };
        if session.is_valid(now) {
            Some(session)
        } else {
            tracing::debug!(expires_at = session.expires_at, "admin session expired");
            self.clear_quietly();
            None
        }
    }

    /// Persist `session`, replacing any stored record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the file cannot be written.
    pub fn save(&self, session: &AdminSession) -> Result<(), SessionError> {
        let mut entries = self.read_entries();
        entries.insert(SESSION_KEY.to_owned(), serde_json::to_value(session)?);
        self.write_entries(&entries)
    }

    /// Remove the stored session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the file cannot be written.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut entries = self.read_entries();
        if entries.remove(SESSION_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn clear_quietly(&self) {
        if let Err(e) = self.clear() {
            tracing::warn!(error = %e, "failed to clear admin session");
        }
    }

    fn read_entries(&self) -> BTreeMap<String, serde_json::Value> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn write_entries(
        &self,
        entries: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = MS_PER_HOUR;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let store = SessionStore::new(dir.path().join("storage.json"));
        (dir, store)
    }

    #[test]
    fn validity_flips_exactly_at_expiry() {
        let session = AdminSession::start(1_000, 500, None);
        assert!(session.is_valid(1_000));
        assert!(session.is_valid(1_499));
        assert!(!session.is_valid(1_500));
        assert!(!session.is_valid(2_000));
    }

    #[test]
    fn unauthenticated_is_never_valid() {
        let session = AdminSession {
            authenticated: false,
            expires_at: i64::MAX,
            token: None,
        };
        assert!(!session.is_valid(0));
        assert_eq!(session.remaining_ms(0), 0);
    }

    #[test]
    fn duration_uses_hours() {
        assert_eq!(session_duration_ms(24), 24 * HOUR);
    }

    #[test]
    fn missing_file_reads_as_logged_out() {
        let (_dir, store) = store();
        assert!(store.load(0).is_none());
    }

    #[test]
    fn save_then_load() {
        let (_dir, store) = store();
        let session = AdminSession::start(0, HOUR, Some("tok".to_owned()));
        assert!(store.save(&session).is_ok());
        assert_eq!(store.load(10), Some(session));
    }

    #[test]
    fn expired_record_is_removed() {
        let (_dir, store) = store();
        let session = AdminSession::start(0, HOUR, None);
        assert!(store.save(&session).is_ok());
        assert!(store.load(HOUR).is_none());
        let raw = std::fs::read_to_string(store.path()).unwrap_or_default();
        assert!(!raw.contains(SESSION_KEY));
    }

    #[test]
    fn corrupted_record_reads_as_logged_out() {
        let (_dir, store) = store();
        let raw = format!("{{\"{SESSION_KEY}\": {{\"authenticated\": \"yes\"}}}}");
        assert!(std::fs::write(store.path(), raw).is_ok());
        assert!(store.load(0).is_none());
    }

    #[test]
    fn unrelated_keys_survive_clear() {
        let (_dir, store) = store();
        assert!(std::fs::write(store.path(), "{\"theme\": \"dark\"}").is_ok());
        assert!(store.save(&AdminSession::start(0, HOUR, None)).is_ok());
        assert!(store.clear().is_ok());
        let raw = std::fs::read_to_string(store.path()).unwrap_or_default();
        assert!(raw.contains("theme"));
        assert!(!raw.contains(SESSION_KEY));
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = serde_json::to_value(AdminSession::start(0, 5, None)).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({"authenticated": true, "expiresAt": 5})
        );
    }
}
