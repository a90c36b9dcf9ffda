//! The data source the server and refresher read from.
//!
//! [`DataSource`] dispatches each read to either the Postgres stores or the
//! in-memory tables. Both variants return identical orderings.

use chrono::{DateTime, Utc};
use observatory_core::pagination::{Cursor, EventPage};
use observatory_types::{
    Agent, AgentId, AgentStatus, Artifact, Briefing, Era, Event, EventId, EventType,
    LeaderboardEntry, Mood, PopulationSample, Quote, QuoteId, World, WorldId,
};

use crate::chronicle_store::ChronicleStore;
use crate::error::DbError;
use crate::event_store::EventStore;
use crate::memory::MemoryStore;
use crate::postgres::PostgresPool;
use crate::roster_store::RosterStore;
use crate::world_store::WorldStore;

/// Where records are read from.
#[derive(Clone)]
pub enum DataSource {
    /// The simulation's `PostgreSQL` database.
    Postgres(PostgresPool),
    /// Tables held in memory.
    Memory(MemoryStore),
}

impl DataSource {
    /// Short name for logs and the health endpoint.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Check that the source is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the database is unreachable.
    pub async fn ping(&self) -> Result<(), DbError> {
        match self {
            Self::Postgres(pg) => pg.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// All worlds, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn worlds(&self) -> Result<Vec<World>, DbError> {
        match self {
            Self::Postgres(pg) => WorldStore::new(pg.pool()).list().await,
            Self::Memory(mem) => Ok(mem.worlds().await),
        }
    }

    /// A single world.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn world(&self, world_id: WorldId) -> Result<Option<World>, DbError> {
        match self {
            Self::Postgres(pg) => WorldStore::new(pg.pool()).get(world_id).await,
            Self::Memory(mem) => Ok(mem.world(world_id).await),
        }
    }

    /// One page of events.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn event_page(
        &self,
        world_id: WorldId,
        cursor: Option<Cursor>,
        limit: u32,
        event_type: Option<EventType>,
    ) -> Result<EventPage, DbError> {
        match self {
            Self::Postgres(pg) => {
                EventStore::new(pg.pool())
                    .page(world_id, cursor, limit, event_type)
                    .await
            }
            Self::Memory(mem) => Ok(mem.event_page(world_id, cursor, limit, event_type).await),
        }
    }

    /// A single event by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn event(&self, world_id: WorldId, event_id: EventId) -> Result<Option<Event>, DbError> {
        match self {
            Self::Postgres(pg) => EventStore::new(pg.pool()).get(world_id, event_id).await,
            Self::Memory(mem) => Ok(mem.event(world_id, event_id).await),
        }
    }

    /// The most recent `limit` events.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn recent_events(&self, world_id: WorldId, limit: u32) -> Result<Vec<Event>, DbError> {
        match self {
            Self::Postgres(pg) => EventStore::new(pg.pool()).recent(world_id, limit).await,
            Self::Memory(mem) => Ok(mem.recent_events(world_id, limit).await),
        }
    }

    /// The most recent `limit` events involving one agent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn agent_events(
        &self,
        world_id: WorldId,
        agent_id: AgentId,
        limit: u32,
    ) -> Result<Vec<Event>, DbError> {
        match self {
            Self::Postgres(pg) => {
                EventStore::new(pg.pool())
                    .by_agent(world_id, agent_id, limit)
                    .await
            }
            Self::Memory(mem) => Ok(mem.agent_events(world_id, agent_id, limit).await),
        }
    }

    /// Number of events at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn count_events_since(
        &self,
        world_id: WorldId,
        since: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        match self {
            Self::Postgres(pg) => EventStore::new(pg.pool()).count_since(world_id, since).await,
            Self::Memory(mem) => Ok(mem.count_events_since(world_id, since).await),
        }
    }

    /// Agents, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn agents(
        &self,
        world_id: WorldId,
        status: Option<AgentStatus>,
    ) -> Result<Vec<Agent>, DbError> {
        match self {
            Self::Postgres(pg) => RosterStore::new(pg.pool()).agents(world_id, status).await,
            Self::Memory(mem) => Ok(mem.agents(world_id, status).await),
        }
    }

    /// The most recent `limit` artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn artifacts(&self, world_id: WorldId, limit: u32) -> Result<Vec<Artifact>, DbError> {
        match self {
            Self::Postgres(pg) => RosterStore::new(pg.pool()).artifacts(world_id, limit).await,
            Self::Memory(mem) => Ok(mem.artifacts(world_id, limit).await),
        }
    }

    /// Every era.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn eras(&self, world_id: WorldId) -> Result<Vec<Era>, DbError> {
        match self {
            Self::Postgres(pg) => ChronicleStore::new(pg.pool()).eras(world_id).await,
            Self::Memory(mem) => Ok(mem.eras(world_id).await),
        }
    }

    /// The most recent `limit` briefings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn briefings(&self, world_id: WorldId, limit: u32) -> Result<Vec<Briefing>, DbError> {
        match self {
            Self::Postgres(pg) => ChronicleStore::new(pg.pool()).briefings(world_id, limit).await,
            Self::Memory(mem) => Ok(mem.briefings(world_id, limit).await),
        }
    }

    /// The most recent `limit` quotes.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn quotes(&self, world_id: WorldId, limit: u32) -> Result<Vec<Quote>, DbError> {
        match self {
            Self::Postgres(pg) => ChronicleStore::new(pg.pool()).quotes(world_id, limit).await,
            Self::Memory(mem) => Ok(mem.quotes(world_id, limit).await),
        }
    }

    /// A single quote by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn quote(&self, world_id: WorldId, quote_id: QuoteId) -> Result<Option<Quote>, DbError> {
        match self {
            Self::Postgres(pg) => ChronicleStore::new(pg.pool()).quote(world_id, quote_id).await,
            Self::Memory(mem) => Ok(mem.quote(world_id, quote_id).await),
        }
    }

    /// The latest mood reading.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn latest_mood(&self, world_id: WorldId) -> Result<Option<Mood>, DbError> {
        match self {
            Self::Postgres(pg) => ChronicleStore::new(pg.pool()).latest_mood(world_id).await,
            Self::Memory(mem) => Ok(mem.latest_mood(world_id).await),
        }
    }

    /// Leaderboard rows, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn leaderboard(
        &self,
        world_id: WorldId,
        category: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>, DbError> {
        match self {
            Self::Postgres(pg) => {
                ChronicleStore::new(pg.pool())
                    .leaderboard(world_id, category)
                    .await
            }
            Self::Memory(mem) => Ok(mem.leaderboard(world_id, category).await),
        }
    }

    /// Population samples for the last `limit` turns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    pub async fn population_history(
        &self,
        world_id: WorldId,
        limit: u32,
    ) -> Result<Vec<PopulationSample>, DbError> {
        match self {
            Self::Postgres(pg) => {
                WorldStore::new(pg.pool())
                    .population_history(world_id, limit)
                    .await
            }
            Self::Memory(mem) => Ok(mem.population_history(world_id, limit).await),
        }
    }
}
