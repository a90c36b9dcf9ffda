//! Read operations on the `events` table.
//!
//! Events are paged newest first on `(created_at, id)`. Each page query
//! fetches one row more than requested so the caller learns whether an
//! older page exists without a separate count.

use chrono::{DateTime, Utc};
use observatory_core::pagination::{Cursor, EventPage};
use observatory_types::{AgentId, Event, EventId, EventType, WorldId};
use sqlx::PgPool;

use crate::error::DbError;
use crate::rows::{EventRow, convert_all, to_u64};

/// Columns selected for every event query.
const EVENT_COLUMNS: &str = "id, world_id, turn_id, turn_number, agent_id, event_type::TEXT AS event_type, title, content, metadata, created_at";

/// Operations on the `events` table.
pub struct EventStore<'a> {
    pool: &'a PgPool,
}

impl<'a> EventStore<'a> {
    /// Create a new event store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one page of events older than `cursor` (or the newest page when
    /// `cursor` is `None`), optionally restricted to one event type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::UnknownTag`] if a row has an unrecognized event type.
    pub async fn page(
        &self,
        world_id: WorldId,
        cursor: Option<Cursor>,
        limit: u32,
        event_type: Option<EventType>,
    ) -> Result<EventPage, DbError> {
        let fetch = i64::from(limit).saturating_add(1);
        let sql = format!(
            r"SELECT {EVENT_COLUMNS}
              FROM events
              WHERE world_id = $1
                AND ($2::TIMESTAMPTZ IS NULL OR (created_at, id) < ($2, $3))
                AND ($4::TEXT IS NULL OR event_type::TEXT = $4)
              ORDER BY created_at DESC, id DESC
              LIMIT $5"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(world_id.into_inner())
            .bind(cursor.map(|c| c.created_at))
            .bind(cursor.map(|c| c.id))
            .bind(event_type.map(EventType::as_str))
            .bind(fetch)
            .fetch_all(self.pool)
            .await?;

        let events: Vec<Event> = convert_all(rows)?;
        tracing::debug!(%world_id, count = events.len(), "Fetched event page");
        Ok(EventPage::from_overfetch(events, limit))
    }

    /// A single event by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or row conversion fails.
    pub async fn get(&self, world_id: WorldId, event_id: EventId) -> Result<Option<Event>, DbError> {
        let sql = format!(
            r"SELECT {EVENT_COLUMNS}
              FROM events
              WHERE world_id = $1 AND id = $2"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(world_id.into_inner())
            .bind(event_id.into_inner())
            .fetch_optional(self.pool)
            .await?;
        row.map(Event::try_from).transpose()
    }

    /// The most recent `limit` events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or row conversion fails.
    pub async fn recent(&self, world_id: WorldId, limit: u32) -> Result<Vec<Event>, DbError> {
        let sql = format!(
            r"SELECT {EVENT_COLUMNS}
              FROM events
              WHERE world_id = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(world_id.into_inner())
            .bind(i64::from(limit))
            .fetch_all(self.pool)
            .await?;
        convert_all(rows)
    }

    /// The most recent `limit` events involving one agent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or row conversion fails.
    pub async fn by_agent(
        &self,
        world_id: WorldId,
        agent_id: AgentId,
        limit: u32,
    ) -> Result<Vec<Event>, DbError> {
        let sql = format!(
            r"SELECT {EVENT_COLUMNS}
              FROM events
              WHERE world_id = $1 AND agent_id = $2
              ORDER BY created_at DESC, id DESC
              LIMIT $3"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(world_id.into_inner())
            .bind(agent_id.into_inner())
            .bind(i64::from(limit))
            .fetch_all(self.pool)
            .await?;
        convert_all(rows)
    }

    /// Number of events recorded at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count_since(
        &self,
        world_id: WorldId,
        since: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM events WHERE world_id = $1 AND created_at >= $2",
        )
        .bind(world_id.into_inner())
        .bind(since)
        .fetch_one(self.pool)
        .await?;
        Ok(to_u64(count))
    }
}
