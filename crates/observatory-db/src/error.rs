//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] error or describes a row that could not be converted into a
//! record.

use observatory_types::UnknownVariant;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A row held a tag outside the known set.
    #[error("invalid row: {0}")]
    UnknownTag(#[from] UnknownVariant),

    /// A cursor supplied by a caller could not be decoded.
    #[error("invalid cursor: {0}")]
    Cursor(#[from] observatory_core::pagination::CursorError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Whether retrying the same read might succeed.
    ///
    /// Connection and pool failures are transient; bad rows and bad
    /// cursors are not.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Postgres(
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}
