//! Read operations on `agents` and `artifacts`.

use observatory_types::{Agent, AgentStatus, Artifact, WorldId};
use sqlx::PgPool;

use crate::error::DbError;
use crate::rows::{AgentRow, ArtifactRow, convert_all};

/// Operations on the `agents` and `artifacts` tables.
pub struct RosterStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RosterStore<'a> {
    /// Create a new roster store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Agents of a world, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or row conversion fails.
    pub async fn agents(
        &self,
        world_id: WorldId,
        status: Option<AgentStatus>,
    ) -> Result<Vec<Agent>, DbError> {
        let rows = sqlx::query_as::<_, AgentRow>(
            r"SELECT id, world_id, name, status::TEXT AS status, belief, born_turn, died_turn, created_at
              FROM agents
              WHERE world_id = $1 AND ($2::TEXT IS NULL OR status::TEXT = $2)
              ORDER BY created_at DESC",
        )
        .bind(world_id.into_inner())
        .bind(status.map(AgentStatus::as_str))
        .fetch_all(self.pool)
        .await?;
        convert_all(rows)
    }

    /// The most recent `limit` artifacts of a world.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn artifacts(&self, world_id: WorldId, limit: u32) -> Result<Vec<Artifact>, DbError> {
        let rows = sqlx::query_as::<_, ArtifactRow>(
            r"SELECT id, world_id, creator_id, name, artifact_type, description, created_at
              FROM artifacts
              WHERE world_id = $1
              ORDER BY created_at DESC
              LIMIT $2",
        )
        .bind(world_id.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
