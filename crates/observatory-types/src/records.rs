//! Row records read from the simulation backend.
//!
//! Each struct mirrors one table. Field names match the column names so
//! the JSON served to the dashboard looks like the rows it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AgentStatus, EventType, WorldStatus};
use crate::ids::{
    AgentId, ArtifactId, BriefingId, EraId, EventId, MoodId, QuoteId, TurnId, WorldId,
};

/// A simulated world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct World {
    /// World identifier.
    pub id: WorldId,
    /// Display name.
    pub name: String,
    /// The most recent completed turn.
    pub current_turn: u64,
    /// Number of living agents as of the current turn.
    pub population: u64,
    /// Lifecycle state.
    pub status: WorldStatus,
    /// When the world was created.
    pub created_at: DateTime<Utc>,
}

/// A recorded occurrence in a world's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// World the event belongs to.
    pub world_id: WorldId,
    /// Turn that produced the event, if any.
    pub turn_id: Option<TurnId>,
    /// Turn number, denormalized for charts.
    pub turn_number: Option<u64>,
    /// Primary agent involved, if any.
    pub agent_id: Option<AgentId>,
    /// Event category.
    pub event_type: EventType,
    /// Short headline.
    pub title: String,
    /// Full narrative text.
    pub content: String,
    /// Free-form metadata attached by the simulation.
    #[ts(type = "Record<string, unknown>")]
    pub metadata: serde_json::Value,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// An agent living (or once living) in a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Agent identifier.
    pub id: AgentId,
    /// World the agent belongs to.
    pub world_id: WorldId,
    /// Display name.
    pub name: String,
    /// Alive or dead.
    pub status: AgentStatus,
    /// Name of the belief the agent holds, if any.
    pub belief: Option<String>,
    /// Turn the agent spawned on.
    pub born_turn: u64,
    /// Turn the agent died on.
    pub died_turn: Option<u64>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Whether the agent counts toward the living population.
    pub fn is_alive(&self) -> bool {
        self.status == AgentStatus::Alive
    }
}

/// An object an agent created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Artifact {
    /// Artifact identifier.
    pub id: ArtifactId,
    /// World the artifact belongs to.
    pub world_id: WorldId,
    /// Creating agent, if known.
    pub creator_id: Option<AgentId>,
    /// Display name.
    pub name: String,
    /// Free-form category (tool, text, monument, ...).
    pub artifact_type: String,
    /// Description written by the simulation.
    pub description: String,
    /// When the artifact was recorded.
    pub created_at: DateTime<Utc>,
}

/// A per-turn narrative summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Briefing {
    /// Briefing identifier.
    pub id: BriefingId,
    /// World the briefing describes.
    pub world_id: WorldId,
    /// Turn the briefing covers.
    pub turn_number: u64,
    /// One-line headline.
    pub headline: String,
    /// Longer summary.
    pub summary: String,
    /// When the briefing was written.
    pub created_at: DateTime<Utc>,
}

/// A named chronological segment of a world's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Era {
    /// Era identifier.
    pub id: EraId,
    /// World the era belongs to.
    pub world_id: WorldId,
    /// Era name.
    pub name: String,
    /// Description of the era.
    pub description: String,
    /// First turn of the era.
    pub start_turn: u64,
    /// Last turn of the era; `None` while the era is ongoing.
    pub end_turn: Option<u64>,
    /// When the era row was created.
    pub created_at: DateTime<Utc>,
}

impl Era {
    /// Whether the era is still running.
    pub const fn is_current(&self) -> bool {
        self.end_turn.is_none()
    }
}

/// A memorable line spoken by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Quote {
    /// Quote identifier.
    pub id: QuoteId,
    /// World the quote belongs to.
    pub world_id: WorldId,
    /// Speaking agent, if still linked.
    pub agent_id: Option<AgentId>,
    /// Name of the speaker at the time.
    pub agent_name: String,
    /// The quoted text.
    pub text: String,
    /// Turn it was spoken on.
    pub turn_number: u64,
    /// When the quote was recorded.
    pub created_at: DateTime<Utc>,
}

/// A world mood reading produced by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Mood {
    /// Mood identifier.
    pub id: MoodId,
    /// World the reading describes.
    pub world_id: WorldId,
    /// Short label ("hopeful", "grim", ...).
    pub label: String,
    /// Score in `-100..=100`.
    pub score: i32,
    /// One-paragraph explanation.
    pub summary: String,
    /// When the reading was taken.
    pub created_at: DateTime<Utc>,
}

/// One row of a leaderboard category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardEntry {
    /// Ranked agent.
    pub agent_id: AgentId,
    /// World the ranking belongs to.
    pub world_id: WorldId,
    /// Agent display name.
    pub agent_name: String,
    /// Category name ("influence", "wealth", ...).
    pub category: String,
    /// Score within the category.
    pub score: i64,
    /// 1-based rank within the category.
    pub rank: u32,
}

/// Population count at the end of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PopulationSample {
    /// World the sample belongs to.
    pub world_id: WorldId,
    /// Turn the sample was taken on.
    pub turn_number: u64,
    /// Living agents at that turn.
    pub population: u64,
    /// When the sample was recorded.
    pub created_at: DateTime<Utc>,
}
