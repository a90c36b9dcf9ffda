//! Read operations on `worlds` and the `world_stats` population history.

use observatory_types::{PopulationSample, World, WorldId};
use sqlx::PgPool;

use crate::error::DbError;
use crate::rows::{PopulationRow, WorldRow, convert_all};

const WORLD_COLUMNS: &str =
    "id, name, current_turn, population, status::TEXT AS status, created_at";

/// Operations on the `worlds` and `world_stats` tables.
pub struct WorldStore<'a> {
    pool: &'a PgPool,
}

impl<'a> WorldStore<'a> {
    /// Create a new world store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All worlds, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or row conversion fails.
    pub async fn list(&self) -> Result<Vec<World>, DbError> {
        let sql = format!("SELECT {WORLD_COLUMNS} FROM worlds ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, WorldRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        convert_all(rows)
    }

    /// A single world, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or row conversion fails.
    pub async fn get(&self, world_id: WorldId) -> Result<Option<World>, DbError> {
        let sql = format!("SELECT {WORLD_COLUMNS} FROM worlds WHERE id = $1");
        let row = sqlx::query_as::<_, WorldRow>(&sql)
            .bind(world_id.into_inner())
            .fetch_optional(self.pool)
            .await?;
        row.map(World::try_from).transpose()
    }

    /// Population samples for the last `limit` turns, ordered by turn.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn population_history(
        &self,
        world_id: WorldId,
        limit: u32,
    ) -> Result<Vec<PopulationSample>, DbError> {
        let rows = sqlx::query_as::<_, PopulationRow>(
            r"SELECT world_id, turn_number, population, created_at
              FROM (
                  SELECT world_id, turn_number, population, created_at
                  FROM world_stats
                  WHERE world_id = $1
                  ORDER BY turn_number DESC, created_at DESC
                  LIMIT $2
              ) recent
              ORDER BY turn_number ASC, created_at ASC",
        )
        .bind(world_id.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
