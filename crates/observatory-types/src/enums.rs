//! Enumeration types stored as text tags in the backend tables.
//!
//! The database stores every tag as lowercase `snake_case` text. Parsing
//! is strict: an unknown tag is an error, never a silent fallback.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A tag string that does not name any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} tag: {value}")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The rejected tag.
    pub value: String,
}

/// Generates `as_str`, `ALL`, `Display`, and `FromStr` for a tag enum.
macro_rules! tag_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The tag as stored in the database and sent on the wire.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

/// The fixed set of event categories the simulation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventType {
    /// An agent said something.
    Speech,
    /// An agent did something.
    Action,
    /// A new agent entered the world.
    Spawn,
    /// An agent died.
    Death,
    /// Two or more agents came into conflict.
    Conflict,
    /// Agents formed an alliance.
    Alliance,
    /// An agent discovered something.
    Discovery,
    /// An agent created an artifact.
    Creation,
    /// A belief was founded, adopted, or abandoned.
    Belief,
    /// Agents exchanged goods.
    Trade,
    /// An agent or group moved.
    Migration,
    /// The world entered a new era.
    EraChange,
    /// Bookkeeping emitted by the simulation itself.
    System,
}

tag_enum!(EventType, "event type", {
    Speech => "speech",
    Action => "action",
    Spawn => "spawn",
    Death => "death",
    Conflict => "conflict",
    Alliance => "alliance",
    Discovery => "discovery",
    Creation => "creation",
    Belief => "belief",
    Trade => "trade",
    Migration => "migration",
    EraChange => "era_change",
    System => "system",
});

/// Whether an agent is still part of the living population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentStatus {
    /// The agent is alive.
    Alive,
    /// The agent has died.
    Dead,
}

tag_enum!(AgentStatus, "agent status", {
    Alive => "alive",
    Dead => "dead",
});

/// Lifecycle state of a world as reported by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WorldStatus {
    /// Turns are being produced.
    Active,
    /// The simulation is halted but may resume.
    Paused,
    /// The world has finished.
    Ended,
}

tag_enum!(WorldStatus, "world status", {
    Active => "active",
    Paused => "paused",
    Ended => "ended",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_tags_round_trip() {
        for et in EventType::ALL {
            assert_eq!(et.as_str().parse::<EventType>().ok(), Some(*et));
        }
    }

    #[test]
    fn serde_matches_database_tag() {
        let json = serde_json::to_string(&EventType::EraChange).unwrap_or_default();
        assert_eq!(json, "\"era_change\"");
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "earthquake".parse::<EventType>();
        assert_eq!(
            err,
            Err(UnknownVariant {
                kind: "event type",
                value: "earthquake".to_owned(),
            })
        );
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert!("Speech".parse::<EventType>().is_err());
        assert!("ALIVE".parse::<AgentStatus>().is_err());
    }
}
