//! Read operations on the backend's summary tables: eras, briefings,
//! quotes, moods, and the leaderboard.

use observatory_types::{Briefing, Era, LeaderboardEntry, Mood, Quote, QuoteId, WorldId};
use sqlx::PgPool;

use crate::error::DbError;
use crate::rows::{BriefingRow, EraRow, LeaderboardRow, MoodRow, QuoteRow};

/// Operations on the summary tables.
pub struct ChronicleStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ChronicleStore<'a> {
    /// Create a new chronicle store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every era of a world, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn eras(&self, world_id: WorldId) -> Result<Vec<Era>, DbError> {
        let rows = sqlx::query_as::<_, EraRow>(
            r"SELECT id, world_id, name, description, start_turn, end_turn, created_at
              FROM eras
              WHERE world_id = $1
              ORDER BY start_turn DESC, created_at DESC",
        )
        .bind(world_id.into_inner())
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The most recent `limit` briefings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn briefings(&self, world_id: WorldId, limit: u32) -> Result<Vec<Briefing>, DbError> {
        let rows = sqlx::query_as::<_, BriefingRow>(
            r"SELECT id, world_id, turn_number, headline, summary, created_at
              FROM briefings
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

    /// The most recent `limit` quotes.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn quotes(&self, world_id: WorldId, limit: u32) -> Result<Vec<Quote>, DbError> {
        let rows = sqlx::query_as::<_, QuoteRow>(
            r"SELECT id, world_id, agent_id, agent_name, text, turn_number, created_at
              FROM quotes
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

    /// A single quote by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn quote(&self, world_id: WorldId, quote_id: QuoteId) -> Result<Option<Quote>, DbError> {
        let row = sqlx::query_as::<_, QuoteRow>(
            r"SELECT id, world_id, agent_id, agent_name, text, turn_number, created_at
              FROM quotes
              WHERE world_id = $1 AND id = $2",
        )
        .bind(world_id.into_inner())
        .bind(quote_id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// The latest mood reading, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn latest_mood(&self, world_id: WorldId) -> Result<Option<Mood>, DbError> {
        let row = sqlx::query_as::<_, MoodRow>(
            r"SELECT id, world_id, label, score, summary, created_at
              FROM moods
              WHERE world_id = $1
              ORDER BY created_at DESC
              LIMIT 1",
        )
        .bind(world_id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Leaderboard rows ordered by category then rank.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn leaderboard(
        &self,
        world_id: WorldId,
        category: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>, DbError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r"SELECT agent_id, world_id, agent_name, category, score, rank
              FROM leaderboard
              WHERE world_id = $1 AND ($2::TEXT IS NULL OR category = $2)
              ORDER BY category ASC, rank ASC",
        )
        .bind(world_id.into_inner())
        .bind(category)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
