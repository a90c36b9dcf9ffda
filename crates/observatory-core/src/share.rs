//! Shareable cards for quotes, eras, events, and the tension meter.

use observatory_types::{Era, Event, Quote, World};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::handle::{HandleError, normalize_handle};
use crate::tension::TensionReading;

/// Longest card body in characters, including the ellipsis.
pub const MAX_CARD_BODY: usize = 280;

const ELLIPSIS: char = '…';

/// What a card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum CardKind {
    /// A quote spoken by an agent.
    Quote,
    /// An era of the world's history.
    Era,
    /// A single event.
    Event,
    /// The current tension reading.
    Tension,
}

/// A rendered share card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShareCard {
    /// Card kind.
    pub kind: CardKind,
    /// Headline.
    pub title: String,
    /// Main text, at most [`MAX_CARD_BODY`] characters.
    pub body: String,
    /// World name and turn line.
    pub footer: String,
    /// `@handle` credit, if one was supplied.
    pub credit: Option<String>,
    /// Link back to the dashboard.
    pub url: String,
}

impl ShareCard {
    /// Plain-text rendering suitable for pasting into a post.
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n\n{}\n\n{}", self.title, self.body, self.footer);
        if let Some(credit) = &self.credit {
            out.push_str("\nshared by ");
            out.push_str(credit);
        }
        out.push('\n');
        out.push_str(&self.url);
        out
    }
}

/// Builds cards for one world.
#[derive(Debug, Clone)]
pub struct CardBuilder<'a> {
    world: &'a World,
    base_url: &'a str,
    credit: Option<String>,
}

impl<'a> CardBuilder<'a> {
    /// Builder for `world`, linking under `base_url`.
    pub const fn new(world: &'a World, base_url: &'a str) -> Self {
        Self {
            world,
            base_url,
            credit: None,
        }
    }

    /// Credit the card to a social handle.
    ///
    /// # Errors
    ///
    /// Returns a [`HandleError`] if the handle is invalid.
    pub fn credit(mut self, raw_handle: Option<&str>) -> Result<Self, HandleError> {
        self.credit = raw_handle
            .map(normalize_handle)
            .transpose()?
            .map(|h| format!("@{h}"));
        Ok(self)
    }

    /// Card for a quote. The text is cut before quoting so both marks survive.
    pub fn quote(&self, quote: &Quote) -> ShareCard {
        let text = truncate_chars(&quote.text, MAX_CARD_BODY.saturating_sub(2));
        self.card(
            CardKind::Quote,
            format!("{} said:", quote.agent_name),
            &format!("\u{201c}{text}\u{201d}"),
            Some(quote.turn_number),
        )
    }

    /// Card for an era.
    pub fn era(&self, era: &Era) -> ShareCard {
        let span = era.end_turn.map_or_else(
            || format!("turn {} to now", era.start_turn),
            |end| format!("turns {}–{end}", era.start_turn),
        );
        self.card(
            CardKind::Era,
            format!("The {} ({span})", era.name),
            &era.description,
            era.end_turn,
        )
    }

    /// Card for an event.
    pub fn event(&self, event: &Event) -> ShareCard {
        self.card(
            CardKind::Event,
            event.title.clone(),
            &event.content,
            event.turn_number,
        )
    }

    /// Card for a tension reading.
    pub fn tension(&self, reading: &TensionReading) -> ShareCard {
        let body = if reading.top_keywords.is_empty() {
            format!(
                "Tension score {} across the last {} events.",
                reading.score, reading.sample_size
            )
        } else {
            format!(
                "Tension score {} across the last {} events. Driven by: {}.",
                reading.score,
                reading.sample_size,
                reading.top_keywords.join(", ")
            )
        };
        self.card(
            CardKind::Tension,
            format!("{} is {}", self.world.name, reading.level.label()),
            &body,
            None,
        )
    }

    fn card(&self, kind: CardKind, title: String, body: &str, turn: Option<u64>) -> ShareCard {
        let turn = turn.unwrap_or(self.world.current_turn);
        ShareCard {
            kind,
            title,
            body: truncate_chars(body, MAX_CARD_BODY),
            footer: format!("{} · turn {turn}", self.world.name),
            credit: self.credit.clone(),
            url: format!(
                "{}/worlds/{}",
                self.base_url.trim_end_matches('/'),
                self.world.id
            ),
        }
    }
}

/// Truncate to at most `max` characters, ending in an ellipsis when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let keep = max.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use observatory_types::{EraId, QuoteId, WorldId, WorldStatus};

    use super::*;
    use crate::tension::TensionLevel;

    fn world() -> World {
        World {
            id: WorldId::new(),
            name: "Aurora".to_owned(),
            current_turn: 42,
            population: 12,
            status: WorldStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn quote_card_includes_credit_and_turn() {
        let world = world();
        let quote = Quote {
            id: QuoteId::new(),
            world_id: world.id,
            agent_id: None,
            agent_name: "Ila".to_owned(),
            text: "We remember the river.".to_owned(),
            turn_number: 7,
            created_at: Utc::now(),
        };
        let builder = CardBuilder::new(&world, "https://observatory.example/")
            .credit(Some("@watcher"));
        let card = builder.map(|b| b.quote(&quote));
        let card = card.unwrap_or_else(|e| panic!("credit: {e}"));
        assert_eq!(card.title, "Ila said:");
        assert_eq!(card.footer, "Aurora · turn 7");
        assert_eq!(card.credit.as_deref(), Some("@watcher"));
        assert_eq!(
            card.url,
            format!("https://observatory.example/worlds/{}", world.id)
        );
        assert!(card.to_text().contains("shared by @watcher"));
    }

    #[test]
    fn long_quote_keeps_closing_mark() {
        let world = world();
        let quote = Quote {
            id: QuoteId::new(),
            world_id: world.id,
            agent_id: None,
            agent_name: "Ila".to_owned(),
            text: "river ".repeat(100),
            turn_number: 7,
            created_at: Utc::now(),
        };
        let card = CardBuilder::new(&world, "https://x").quote(&quote);
        assert!(card.body.starts_with('\u{201c}'));
        assert!(card.body.ends_with("\u{2026}\u{201d}"));
        assert!(card.body.chars().count() <= MAX_CARD_BODY);
    }

    #[test]
    fn invalid_credit_is_rejected() {
        let world = world();
        let result = CardBuilder::new(&world, "https://x").credit(Some("not valid!"));
        assert!(result.is_err());
    }

    #[test]
    fn ongoing_era_uses_current_turn() {
        let world = world();
        let era = Era {
            id: EraId::new(),
            world_id: world.id,
            name: "Age of Fire".to_owned(),
            description: "Everything burned.".to_owned(),
            start_turn: 30,
            end_turn: None,
            created_at: Utc::now(),
        };
        let card = CardBuilder::new(&world, "https://x").era(&era);
        assert_eq!(card.title, "The Age of Fire (turn 30 to now)");
        assert_eq!(card.footer, "Aurora · turn 42");
    }

    #[test]
    fn tension_card_lists_keywords() {
        let world = world();
        let reading = TensionReading {
            score: 14,
            level: TensionLevel::Tense,
            sample_size: 20,
            top_keywords: vec!["war".to_owned(), "fear".to_owned()],
        };
        let card = CardBuilder::new(&world, "https://x").tension(&reading);
        assert_eq!(card.title, "Aurora is Tense");
        assert!(card.body.ends_with("Driven by: war, fear."));
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let text = "é".repeat(400);
        let out = truncate_chars(&text, MAX_CARD_BODY);
        assert_eq!(out.chars().count(), MAX_CARD_BODY);
        assert!(out.ends_with(ELLIPSIS));
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
