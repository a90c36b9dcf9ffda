//! The cached per-world dashboard.
//!
//! The server's refresher fetches a handful of row sets for each world and
//! folds them into one [`DashboardSnapshot`]. Assembly is pure so the
//! numbers can be tested without a data source.

use chrono::{DateTime, Utc};
use observatory_types::{Agent, Briefing, Era, Event, Mood, PopulationSample, World};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::charts::{
    ActivityPoint, BeliefShare, PopulationPoint, TurnBucket, activity_by_turn, activity_by_type,
    belief_distribution, population_series,
};
use crate::tension::{TensionReading, score_events};

/// Events fetched per refresh for the activity charts.
pub const ACTIVITY_EVENT_WINDOW: u32 = 200;

/// Turns of population history fetched per refresh.
pub const POPULATION_HISTORY_TURNS: u32 = 100;

/// Turns shown in the activity-by-turn chart.
pub const ACTIVITY_TURN_BUCKETS: usize = 20;

/// Headline counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DashboardStats {
    /// The world's current turn.
    pub current_turn: u64,
    /// Population as reported by the world row.
    pub population: u64,
    /// Agents with status `alive`.
    pub alive_agents: u32,
    /// Agents with status `dead`.
    pub dead_agents: u32,
    /// Events recorded in the 24 hours before the refresh.
    pub events_last_day: u64,
    /// Eras recorded so far.
    pub era_count: u32,
}

/// Everything the refresher fetched for one world.
#[derive(Debug, Clone)]
pub struct DashboardInputs {
    /// The world row.
    pub world: World,
    /// Most recent events, newest first.
    pub recent_events: Vec<Event>,
    /// Every agent, alive or dead.
    pub agents: Vec<Agent>,
    /// Every era, most recent first.
    pub eras: Vec<Era>,
    /// Population history.
    pub population: Vec<PopulationSample>,
    /// Latest mood reading.
    pub mood: Option<Mood>,
    /// Latest briefing.
    pub latest_briefing: Option<Briefing>,
    /// Event count for the last 24 hours.
    pub events_last_day: u64,
}

/// The cached dashboard for one world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DashboardSnapshot {
    /// The world row at refresh time.
    pub world: World,
    /// Headline counters.
    pub stats: DashboardStats,
    /// Tension over the most recent events.
    pub tension: TensionReading,
    /// Latest mood reading.
    pub mood: Option<Mood>,
    /// The era without an end turn, if any.
    pub current_era: Option<Era>,
    /// Latest briefing.
    pub latest_briefing: Option<Briefing>,
    /// Event counts by type.
    pub activity: Vec<ActivityPoint>,
    /// Event counts for the latest turns.
    pub activity_by_turn: Vec<TurnBucket>,
    /// Population over time.
    pub population: Vec<PopulationPoint>,
    /// Belief shares among living agents.
    pub beliefs: Vec<BeliefShare>,
    /// When the snapshot was built.
    pub refreshed_at: DateTime<Utc>,
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl DashboardSnapshot {
    /// Fold fetched rows into a snapshot stamped `refreshed_at`.
    pub fn assemble(inputs: DashboardInputs, refreshed_at: DateTime<Utc>) -> Self {
        let alive = inputs.agents.iter().filter(|a| a.is_alive()).count();
        let dead = inputs.agents.len().saturating_sub(alive);

        let stats = DashboardStats {
            current_turn: inputs.world.current_turn,
            population: inputs.world.population,
            alive_agents: count_u32(alive),
            dead_agents: count_u32(dead),
            events_last_day: inputs.events_last_day,
            era_count: count_u32(inputs.eras.len()),
        };

        let current_era = inputs.eras.iter().find(|e| e.is_current()).cloned();

        Self {
            stats,
            tension: score_events(&inputs.recent_events),
            mood: inputs.mood,
            current_era,
            latest_briefing: inputs.latest_briefing,
            activity: activity_by_type(&inputs.recent_events),
            activity_by_turn: activity_by_turn(&inputs.recent_events, ACTIVITY_TURN_BUCKETS),
            population: population_series(&inputs.population),
            beliefs: belief_distribution(&inputs.agents),
            world: inputs.world,
            refreshed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use observatory_types::{
        AgentId, AgentStatus, EraId, EventId, EventType, WorldId, WorldStatus,
    };

    use super::*;

    fn world() -> World {
        World {
            id: WorldId::new(),
            name: "Ashfall".to_owned(),
            current_turn: 9,
            population: 2,
            status: WorldStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn agent(world_id: WorldId, status: AgentStatus, belief: Option<&str>) -> Agent {
        Agent {
            id: AgentId::new(),
            world_id,
            name: "a".to_owned(),
            status,
            belief: belief.map(ToOwned::to_owned),
            born_turn: 1,
            died_turn: None,
            created_at: Utc::now(),
        }
    }

    fn era(world_id: WorldId, start_turn: u64, end_turn: Option<u64>) -> Era {
        Era {
            id: EraId::new(),
            world_id,
            name: format!("era {start_turn}"),
            description: String::new(),
            start_turn,
            end_turn,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn assemble_counts_and_picks_current_era() {
        let w = world();
        let inputs = DashboardInputs {
            recent_events: vec![Event {
                id: EventId::new(),
                world_id: w.id,
                turn_id: None,
                turn_number: Some(9),
                agent_id: None,
                event_type: EventType::Conflict,
                title: "Battle at the ford".to_owned(),
                content: String::new(),
                metadata: serde_json::json!({}),
                created_at: Utc::now(),
            }],
            agents: vec![
                agent(w.id, AgentStatus::Alive, Some("sun")),
                agent(w.id, AgentStatus::Alive, None),
                agent(w.id, AgentStatus::Dead, Some("sun")),
            ],
            eras: vec![era(w.id, 5, None), era(w.id, 0, Some(4))],
            population: Vec::new(),
            mood: None,
            latest_briefing: None,
            events_last_day: 7,
            world: w,
        };

        let snapshot = DashboardSnapshot::assemble(inputs, Utc::now());
        assert_eq!(snapshot.stats.alive_agents, 2);
        assert_eq!(snapshot.stats.dead_agents, 1);
        assert_eq!(snapshot.stats.era_count, 2);
        assert_eq!(snapshot.stats.events_last_day, 7);
        assert_eq!(snapshot.current_era.map(|e| e.start_turn), Some(5));
        // "battle" (3) plus the conflict bonus (2).
        assert_eq!(snapshot.tension.score, 5);
        let percents: u32 = snapshot.beliefs.iter().map(|b| b.percent).sum();
        assert_eq!(percents, 100);
        assert_eq!(snapshot.activity_by_turn.len(), 1);
    }
}
