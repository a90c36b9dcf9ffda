//! Raw table rows and their conversion into typed records.
//!
//! Rows use database-native types (`i64`, `String`, bare `Uuid`). Each
//! conversion parses tags strictly and clamps counters that are negative
//! in the database to zero.

use chrono::{DateTime, Utc};
use observatory_types::{
    Agent, AgentStatus, Artifact, Briefing, Era, Event, EventType, LeaderboardEntry, Mood,
    PopulationSample, Quote, World, WorldStatus,
};
use uuid::Uuid;

use crate::error::DbError;

/// Convert a database counter to `u64`, clamping negatives to zero.
pub(crate) fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// A row from the `worlds` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorldRow {
    /// World id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Current turn.
    pub current_turn: i64,
    /// Living population.
    pub population: i64,
    /// Status tag.
    pub status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<WorldRow> for World {
    type Error = DbError;

    fn try_from(row: WorldRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            current_turn: to_u64(row.current_turn),
            population: to_u64(row.population),
            status: row.status.parse::<WorldStatus>()?,
            created_at: row.created_at,
        })
    }
}

/// A row from the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Event id.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Producing turn.
    pub turn_id: Option<Uuid>,
    /// Turn number.
    pub turn_number: Option<i64>,
    /// Primary agent.
    pub agent_id: Option<Uuid>,
    /// Event type tag (cast to text).
    pub event_type: String,
    /// Headline.
    pub title: String,
    /// Narrative text.
    pub content: String,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            world_id: row.world_id.into(),
            turn_id: row.turn_id.map(Into::into),
            turn_number: row.turn_number.map(to_u64),
            agent_id: row.agent_id.map(Into::into),
            event_type: row.event_type.parse::<EventType>()?,
            title: row.title,
            content: row.content,
            metadata: row
                .metadata
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
            created_at: row.created_at,
        })
    }
}

/// A row from the `agents` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgentRow {
    /// Agent id.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Display name.
    pub name: String,
    /// Status tag.
    pub status: String,
    /// Held belief.
    pub belief: Option<String>,
    /// Spawn turn.
    pub born_turn: i64,
    /// Death turn.
    pub died_turn: Option<i64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AgentRow> for Agent {
    type Error = DbError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            world_id: row.world_id.into(),
            name: row.name,
            status: row.status.parse::<AgentStatus>()?,
            belief: row.belief,
            born_turn: to_u64(row.born_turn),
            died_turn: row.died_turn.map(to_u64),
            created_at: row.created_at,
        })
    }
}

/// A row from the `artifacts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArtifactRow {
    /// Artifact id.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Creating agent.
    pub creator_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Category.
    pub artifact_type: String,
    /// Description.
    pub description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<ArtifactRow> for Artifact {
    fn from(row: ArtifactRow) -> Self {
        Self {
            id: row.id.into(),
            world_id: row.world_id.into(),
            creator_id: row.creator_id.map(Into::into),
            name: row.name,
            artifact_type: row.artifact_type,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// A row from the `briefings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BriefingRow {
    /// Briefing id.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Covered turn.
    pub turn_number: i64,
    /// Headline.
    pub headline: String,
    /// Summary.
    pub summary: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<BriefingRow> for Briefing {
    fn from(row: BriefingRow) -> Self {
        Self {
            id: row.id.into(),
            world_id: row.world_id.into(),
            turn_number: to_u64(row.turn_number),
            headline: row.headline,
            summary: row.summary,
            created_at: row.created_at,
        }
    }
}

/// A row from the `eras` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EraRow {
    /// Era id.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// First turn.
    pub start_turn: i64,
    /// Last turn.
    pub end_turn: Option<i64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<EraRow> for Era {
    fn from(row: EraRow) -> Self {
        Self {
            id: row.id.into(),
            world_id: row.world_id.into(),
            name: row.name,
            description: row.description,
            start_turn: to_u64(row.start_turn),
            end_turn: row.end_turn.map(to_u64),
            created_at: row.created_at,
        }
    }
}

/// A row from the `quotes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuoteRow {
    /// Quote id.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Speaker.
    pub agent_id: Option<Uuid>,
    /// Speaker name.
    pub agent_name: String,
    /// Quoted text.
    pub text: String,
    /// Turn spoken.
    pub turn_number: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<QuoteRow> for Quote {
    fn from(row: QuoteRow) -> Self {
        Self {
            id: row.id.into(),
            world_id: row.world_id.into(),
            agent_id: row.agent_id.map(Into::into),
            agent_name: row.agent_name,
            text: row.text,
            turn_number: to_u64(row.turn_number),
            created_at: row.created_at,
        }
    }
}

/// A row from the `moods` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MoodRow {
    /// Mood id.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Label.
    pub label: String,
    /// Score.
    pub score: i32,
    /// Summary.
    pub summary: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<MoodRow> for Mood {
    fn from(row: MoodRow) -> Self {
        Self {
            id: row.id.into(),
            world_id: row.world_id.into(),
            label: row.label,
            score: row.score.clamp(-100, 100),
            summary: row.summary,
            created_at: row.created_at,
        }
    }
}

/// A row from the `leaderboard` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaderboardRow {
    /// Ranked agent.
    pub agent_id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Agent name.
    pub agent_name: String,
    /// Category.
    pub category: String,
    /// Score.
    pub score: i64,
    /// Rank.
    pub rank: i32,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            agent_id: row.agent_id.into(),
            world_id: row.world_id.into(),
            agent_name: row.agent_name,
            category: row.category,
            score: row.score,
            rank: u32::try_from(row.rank).unwrap_or(0),
        }
    }
}

/// A row from the `world_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PopulationRow {
    /// Owning world.
    pub world_id: Uuid,
    /// Turn number.
    pub turn_number: i64,
    /// Population.
    pub population: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<PopulationRow> for PopulationSample {
    fn from(row: PopulationRow) -> Self {
        Self {
            world_id: row.world_id.into(),
            turn_number: to_u64(row.turn_number),
            population: to_u64(row.population),
            created_at: row.created_at,
        }
    }
}

/// Convert a batch of rows, failing on the first bad one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DbError>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_row(event_type: &str) -> EventRow {
        EventRow {
            id: Uuid::now_v7(),
            world_id: Uuid::now_v7(),
            turn_id: None,
            turn_number: Some(-3),
            agent_id: None,
            event_type: event_type.to_owned(),
            title: "t".to_owned(),
            content: "c".to_owned(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn event_row_converts() {
        let event = Event::try_from(event_row("conflict"));
        let event = event.ok();
        assert_eq!(event.as_ref().map(|e| e.event_type), Some(EventType::Conflict));
        // Negative turn numbers clamp to zero and null metadata becomes `{}`.
        assert_eq!(event.as_ref().and_then(|e| e.turn_number), Some(0));
        assert_eq!(
            event.map(|e| e.metadata),
            Some(serde_json::json!({}))
        );
    }

    #[test]
    fn unknown_event_type_is_an_error() {
        let result = Event::try_from(event_row("meteor"));
        assert!(matches!(result, Err(DbError::UnknownTag(_))));
    }

    #[test]
    fn mood_score_is_clamped() {
        let mood = Mood::from(MoodRow {
            id: Uuid::now_v7(),
            world_id: Uuid::now_v7(),
            label: "ecstatic".to_owned(),
            score: 400,
            summary: String::new(),
            created_at: Utc::now(),
        });
        assert_eq!(mood.score, 100);
    }

    #[test]
    fn negative_counters_clamp_to_zero() {
        assert_eq!(to_u64(-1), 0);
        assert_eq!(to_u64(i64::MAX), 9_223_372_036_854_775_807);
    }
}
