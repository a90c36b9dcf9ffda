//! Tension meter: a keyword heuristic over recent event text.
//!
//! The score is a display aid only. Each recent event contributes the
//! weights of the keywords found in its title or content (each keyword
//! at most once per event), conflict events add a flat bonus, and peace
//! keywords pull the total down. The total never drops below zero and is
//! bucketed into four [`TensionLevel`]s.

use std::collections::BTreeMap;

use observatory_types::{Event, EventType};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Maximum number of recent events considered.
pub const TENSION_WINDOW: usize = 20;

/// Flat bonus for an event whose type is [`EventType::Conflict`].
pub const CONFLICT_TYPE_BONUS: i64 = 2;

/// How many contributing keywords a reading reports.
const TOP_KEYWORDS: usize = 3;

/// Keyword table: `(substring, weight)`. Negative weights calm the world.
const KEYWORDS: &[(&str, i64)] = &[
    ("war", 3),
    ("kill", 3),
    ("murder", 3),
    ("battle", 3),
    ("attack", 3),
    ("betray", 3),
    ("fight", 2),
    ("threat", 2),
    ("rebel", 2),
    ("steal", 2),
    ("conflict", 2),
    ("anger", 2),
    ("argue", 1),
    ("fear", 1),
    ("tension", 1),
    ("rival", 1),
    ("suspicious", 1),
    ("peace", -1),
    ("alliance", -1),
    ("celebrate", -1),
    ("cooperate", -1),
];

/// Display bucket for a tension score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum TensionLevel {
    /// 0..=4
    Calm,
    /// 5..=11
    Uneasy,
    /// 12..=21
    Tense,
    /// 22 and above
    Critical,
}

impl TensionLevel {
    /// Bucket a non-negative score.
    pub const fn from_score(score: i64) -> Self {
        match score {
            i64::MIN..=4 => Self::Calm,
            5..=11 => Self::Uneasy,
            12..=21 => Self::Tense,
            _ => Self::Critical,
        }
    }

    /// Label shown on the meter.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Calm => "Calm",
            Self::Uneasy => "Uneasy",
            Self::Tense => "Tense",
            Self::Critical => "Critical",
        }
    }
}

/// The result of scoring a window of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TensionReading {
    /// Clamped, non-negative score.
    pub score: i64,
    /// Bucketed level.
    pub level: TensionLevel,
    /// Number of events that were scored.
    pub sample_size: u32,
    /// Keywords with the largest positive contribution, highest first.
    pub top_keywords: Vec<String>,
}

/// Score the most recent events (newest first).
///
/// Only the first [`TENSION_WINDOW`] events are considered.
pub fn score_events(events: &[Event]) -> TensionReading {
    let window = events.iter().take(TENSION_WINDOW);
    let mut total: i64 = 0;
    let mut sample_size: u32 = 0;
    let mut contributions: BTreeMap<&'static str, i64> = BTreeMap::new();

    for event in window {
        sample_size = sample_size.saturating_add(1);
        let text = format!("{} {}", event.title, event.content).to_lowercase();

        for (keyword, weight) in KEYWORDS {
            if text.contains(keyword) {
                total = total.saturating_add(*weight);
                if *weight > 0 {
                    let entry = contributions.entry(keyword).or_insert(0);
                    *entry = entry.saturating_add(*weight);
                }
            }
        }

        if event.event_type == EventType::Conflict {
            total = total.saturating_add(CONFLICT_TYPE_BONUS);
        }
    }

    let score = total.max(0);

    let mut ranked: Vec<(&'static str, i64)> = contributions.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_keywords = ranked
        .into_iter()
        .take(TOP_KEYWORDS)
        .map(|(k, _)| k.to_owned())
        .collect();

    TensionReading {
        score,
        level: TensionLevel::from_score(score),
        sample_size,
        top_keywords,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use observatory_types::{EventId, WorldId};

    use super::*;

    fn event(event_type: EventType, title: &str, content: &str) -> Event {
        Event {
            id: EventId::new(),
            world_id: WorldId::new(),
            turn_id: None,
            turn_number: Some(1),
            agent_id: None,
            event_type,
            title: title.to_owned(),
            content: content.to_owned(),
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_events_is_calm() {
        let reading = score_events(&[]);
        assert_eq!(reading.score, 0);
        assert_eq!(reading.level, TensionLevel::Calm);
        assert_eq!(reading.sample_size, 0);
        assert!(reading.top_keywords.is_empty());
    }

    #[test]
    fn keyword_counts_once_per_event() {
        let reading = score_events(&[event(
            EventType::Speech,
            "War drums",
            "war war war, the war is coming",
        )]);
        assert_eq!(reading.score, 3);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        // "Attacked" contains "attack"; "Warrior" contains "war".
        let reading = score_events(&[event(EventType::Action, "Attacked", "The Warrior fled")]);
        assert_eq!(reading.score, 6);
    }

    #[test]
    fn conflict_type_adds_bonus() {
        let reading = score_events(&[event(EventType::Conflict, "Dispute", "over grain")]);
        assert_eq!(reading.score, CONFLICT_TYPE_BONUS);
    }

    #[test]
    fn peace_keywords_reduce_but_never_below_zero() {
        let reading = score_events(&[event(
            EventType::Alliance,
            "Peace treaty",
            "They celebrate the alliance and cooperate",
        )]);
        assert_eq!(reading.score, 0);
        assert_eq!(reading.level, TensionLevel::Calm);
    }

    #[test]
    fn only_window_is_scored() {
        let events: Vec<Event> = (0..30)
            .map(|_| event(EventType::Speech, "fear", ""))
            .collect();
        let reading = score_events(&events);
        assert_eq!(reading.sample_size, 20);
        assert_eq!(reading.score, 20);
        assert_eq!(reading.level, TensionLevel::Tense);
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(TensionLevel::from_score(0), TensionLevel::Calm);
        assert_eq!(TensionLevel::from_score(4), TensionLevel::Calm);
        assert_eq!(TensionLevel::from_score(5), TensionLevel::Uneasy);
        assert_eq!(TensionLevel::from_score(11), TensionLevel::Uneasy);
        assert_eq!(TensionLevel::from_score(12), TensionLevel::Tense);
        assert_eq!(TensionLevel::from_score(21), TensionLevel::Tense);
        assert_eq!(TensionLevel::from_score(22), TensionLevel::Critical);
    }

    #[test]
    fn top_keywords_ranked_by_contribution() {
        let reading = score_events(&[
            event(EventType::Speech, "a threat", "and fear"),
            event(EventType::Speech, "another threat", ""),
            event(EventType::Speech, "murder", ""),
        ]);
        assert_eq!(reading.top_keywords, vec!["threat", "murder", "fear"]);
    }
}
