//! Server-side registry of admin session tokens.
//!
//! A successful password check issues a random token that the admin API
//! accepts as `Authorization: Bearer <token>` until it expires or is
//! revoked. Tokens live only in memory; a restart logs every admin out.

use std::collections::HashMap;
use std::fmt::Write as _;

use rand::Rng;
use tokio::sync::RwLock;

/// Length of an issued token in characters.
pub const TOKEN_LEN: usize = 48;

/// Random bytes behind a token; hex encoding doubles the length.
const TOKEN_BYTES: usize = TOKEN_LEN / 2;

/// Generate a fresh hex token.
fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(TOKEN_LEN), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Constant-time string comparison.
///
/// Only the length is allowed to leak.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a
        .bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    diff == 0
}

/// A token handed to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    /// Bearer token.
    pub token: String,
    /// Expiry in epoch milliseconds.
    pub expires_at: i64,
}

/// Outstanding admin tokens and their expiries.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    tokens: RwLock<HashMap<String, i64>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token valid for `duration_ms` from `now`.
    pub async fn issue(&self, now: i64, duration_ms: i64) -> IssuedSession {
        let token = generate_token();
        let expires_at = now.saturating_add(duration_ms);
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, expiry| now < *expiry);
        tokens.insert(token.clone(), expires_at);
        IssuedSession { token, expires_at }
    }

    /// Whether `token` is known and unexpired at `now`. An expired token is
    /// dropped.
    pub async fn validate(&self, token: &str, now: i64) -> bool {
        let expiry = self.tokens.read().await.get(token).copied();
        match expiry {
            Some(expires_at) if now < expires_at => true,
            Some(_) => {
                self.tokens.write().await.remove(token);
                false
            }
            None => false,
        }
    }

    /// Revoke a token. Returns whether it was outstanding.
    pub async fn revoke(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }

    /// Number of outstanding tokens, expired or not.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Whether no tokens are outstanding.
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}
