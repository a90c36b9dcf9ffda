//! Chart series derived from already-materialized rows.
//!
//! Nothing here touches the database. Each function maps or reduces a
//! slice of records into the points a chart component draws.

use std::collections::BTreeMap;

use observatory_types::{Agent, Event, EventType, PopulationSample};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Bucket name for agents that hold no belief.
pub const UNAFFILIATED: &str = "unaffiliated";

/// Event count for one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActivityPoint {
    /// Event type.
    pub event_type: EventType,
    /// Number of events of that type.
    pub count: u32,
}

/// Event count for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnBucket {
    /// Turn number.
    pub turn_number: u64,
    /// Number of events recorded on that turn.
    pub count: u32,
}

/// Population at one turn plus the change from the previous point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PopulationPoint {
    /// Turn number.
    pub turn_number: u64,
    /// Living agents.
    pub population: u64,
    /// Change from the previous point (0 for the first point).
    pub delta: i64,
}

/// Share of the living population holding one belief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BeliefShare {
    /// Belief name, or [`UNAFFILIATED`].
    pub belief: String,
    /// Number of living adherents.
    pub adherents: u32,
    /// Whole-number percent; all shares sum to 100.
    pub percent: u32,
}

/// Count events per type, most frequent first, ties broken by tag name.
pub fn activity_by_type(events: &[Event]) -> Vec<ActivityPoint> {
    let mut counts: BTreeMap<EventType, u32> = BTreeMap::new();
    for event in events {
        let entry = counts.entry(event.event_type).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    let mut points: Vec<ActivityPoint> = counts
        .into_iter()
        .map(|(event_type, count)| ActivityPoint { event_type, count })
        .collect();
    points.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.event_type.as_str().cmp(b.event_type.as_str()))
    });
    points
}

/// Count events per turn, keeping the last `buckets` turns in ascending order.
///
/// Events without a turn number are skipped.
pub fn activity_by_turn(events: &[Event], buckets: usize) -> Vec<TurnBucket> {
    let mut counts: BTreeMap<u64, u32> = BTreeMap::new();
    for turn in events.iter().filter_map(|e| e.turn_number) {
        let entry = counts.entry(turn).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    let skip = counts.len().saturating_sub(buckets);
    counts
        .into_iter()
        .skip(skip)
        .map(|(turn_number, count)| TurnBucket { turn_number, count })
        .collect()
}

/// Order population samples by turn and attach deltas.
///
/// When several samples share a turn, the one recorded last wins.
pub fn population_series(samples: &[PopulationSample]) -> Vec<PopulationPoint> {
    let mut latest: BTreeMap<u64, &PopulationSample> = BTreeMap::new();
    for sample in samples {
        match latest.get(&sample.turn_number) {
            Some(existing) if existing.created_at >= sample.created_at => {}
            _ => {
                latest.insert(sample.turn_number, sample);
            }
        }
    }

    let mut previous: Option<u64> = None;
    latest
        .into_values()
        .map(|sample| {
            let delta = previous.map_or(0, |prev| signed_diff(sample.population, prev));
            previous = Some(sample.population);
            PopulationPoint {
                turn_number: sample.turn_number,
                population: sample.population,
                delta,
            }
        })
        .collect()
}

/// Group living agents by belief with whole-number percents.
///
/// Percents use the largest-remainder method so they always sum to 100
/// when at least one living agent exists. Shares are ordered by adherents
/// descending, then by belief name.
pub fn belief_distribution(agents: &[Agent]) -> Vec<BeliefShare> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for agent in agents.iter().filter(|a| a.is_alive()) {
        let belief = agent
            .belief
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(UNAFFILIATED);
        let entry = counts.entry(belief.to_owned()).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    let total: u32 = counts.values().fold(0u32, |acc, c| acc.saturating_add(*c));
    if total == 0 {
        return Vec::new();
    }

    // (belief, adherents, floor percent, remainder numerator)
    let mut rows: Vec<(String, u32, u32, u32)> = counts
        .into_iter()
        .map(|(belief, adherents)| {
            let scaled = adherents.saturating_mul(100);
            let floor = scaled.checked_div(total).unwrap_or(0);
            let remainder = scaled.checked_rem(total).unwrap_or(0);
            (belief, adherents, floor, remainder)
        })
        .collect();

    let assigned: u32 = rows.iter().fold(0u32, |acc, r| acc.saturating_add(r.2));
    let mut leftover = 100u32.saturating_sub(assigned);

    let mut by_remainder: Vec<usize> = (0..rows.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let (ra, rb) = (rows.get(a), rows.get(b));
        match (ra, rb) {
            (Some(ra), Some(rb)) => rb.3.cmp(&ra.3).then_with(|| ra.0.cmp(&rb.0)),
            _ => core::cmp::Ordering::Equal,
        }
    });
    for idx in by_remainder {
        if leftover == 0 {
            break;
        }
        if let Some(row) = rows.get_mut(idx) {
            row.2 = row.2.saturating_add(1);
            leftover = leftover.saturating_sub(1);
        }
    }

    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.into_iter()
        .map(|(belief, adherents, percent, _)| BeliefShare {
            belief,
            adherents,
            percent,
        })
        .collect()
}

/// `a - b` as a signed value, saturating at the `i64` bounds.
fn signed_diff(a: u64, b: u64) -> i64 {
    if a >= b {
        i64::try_from(a.saturating_sub(b)).unwrap_or(i64::MAX)
    } else {
        i64::try_from(b.saturating_sub(a))
            .map(i64::saturating_neg)
            .unwrap_or(i64::MIN)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use observatory_types::{AgentId, AgentStatus, EventId, WorldId};

    use super::*;

    fn event(event_type: EventType, turn: Option<u64>) -> Event {
        Event {
            id: EventId::new(),
            world_id: WorldId::new(),
            turn_id: None,
            turn_number: turn,
            agent_id: None,
            event_type,
            title: String::new(),
            content: String::new(),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    fn agent(belief: Option<&str>, status: AgentStatus) -> Agent {
        Agent {
            id: AgentId::new(),
            world_id: WorldId::new(),
            name: "a".to_owned(),
            status,
            belief: belief.map(ToOwned::to_owned),
            born_turn: 0,
            died_turn: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn activity_by_type_sorted_by_count_then_name() {
        let events = vec![
            event(EventType::Trade, None),
            event(EventType::Speech, None),
            event(EventType::Speech, None),
            event(EventType::Action, None),
        ];
        let points = activity_by_type(&events);
        let order: Vec<(EventType, u32)> =
            points.iter().map(|p| (p.event_type, p.count)).collect();
        assert_eq!(
            order,
            vec![
                (EventType::Speech, 2),
                (EventType::Action, 1),
                (EventType::Trade, 1),
            ]
        );
    }

    #[test]
    fn activity_by_turn_keeps_last_buckets() {
        let events = vec![
            event(EventType::Speech, Some(1)),
            event(EventType::Speech, Some(2)),
            event(EventType::Speech, Some(3)),
            event(EventType::Speech, Some(3)),
            event(EventType::Speech, None),
        ];
        let buckets = activity_by_turn(&events, 2);
        assert_eq!(
            buckets,
            vec![
                TurnBucket {
                    turn_number: 2,
                    count: 1
                },
                TurnBucket {
                    turn_number: 3,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn population_series_orders_and_dedups() {
        let world_id = WorldId::new();
        let now = Utc::now();
        let samples = vec![
            PopulationSample {
                world_id,
                turn_number: 2,
                population: 12,
                created_at: now,
            },
            PopulationSample {
                world_id,
                turn_number: 1,
                population: 10,
                created_at: now,
            },
            PopulationSample {
                world_id,
                turn_number: 2,
                population: 8,
                created_at: now + Duration::seconds(5),
            },
        ];
        let series = population_series(&samples);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().map(|p| p.delta), Some(0));
        assert_eq!(series.get(1).map(|p| (p.population, p.delta)), Some((8, -2)));
    }

    #[test]
    fn belief_percents_sum_to_one_hundred() {
        let agents = vec![
            agent(Some("Sun"), AgentStatus::Alive),
            agent(Some("Sun"), AgentStatus::Alive),
            agent(Some("Moon"), AgentStatus::Alive),
            agent(None, AgentStatus::Alive),
            agent(Some("Moon"), AgentStatus::Dead),
            agent(Some("Tide"), AgentStatus::Alive),
            agent(Some(" "), AgentStatus::Alive),
        ];
        let shares = belief_distribution(&agents);
        let total: u32 = shares.iter().map(|s| s.percent).sum();
        assert_eq!(total, 100);
        assert_eq!(shares.first().map(|s| s.belief.as_str()), Some("Sun"));
        assert_eq!(shares.get(1).map(|s| s.belief.as_str()), Some(UNAFFILIATED));
        assert!(shares.iter().all(|s| s.belief != "Moon" || s.adherents == 1));
    }

    #[test]
    fn thirds_round_to_one_hundred() {
        let agents = vec![
            agent(Some("A"), AgentStatus::Alive),
            agent(Some("B"), AgentStatus::Alive),
            agent(Some("C"), AgentStatus::Alive),
        ];
        let shares = belief_distribution(&agents);
        let percents: Vec<u32> = shares.iter().map(|s| s.percent).collect();
        assert_eq!(percents, vec![34, 33, 33]);
    }

    #[test]
    fn no_living_agents_is_empty() {
        let agents = vec![agent(Some("A"), AgentStatus::Dead)];
        assert!(belief_distribution(&agents).is_empty());
    }
}
