//! Timestamp-cursor pagination over the event log.
//!
//! Pages are ordered newest first by `(created_at, id)`. A [`Cursor`] marks
//! the last row a caller has already seen; the next page holds strictly
//! older rows. The id breaks ties between rows sharing a timestamp, so a
//! burst of events written in the same instant is never skipped.
//!
//! [`EventPager`] is the client-side accumulator: it keeps every row it
//! has delivered, drops duplicates, and only advances its cursor.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use observatory_types::{Event, EventId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Rows per page requested by the dashboard.
pub const PAGE_SIZE: u32 = 20;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Separator between the timestamp and id in the wire form.
const CURSOR_SEPARATOR: char = '|';

/// Errors produced while decoding a cursor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The cursor did not contain the separator.
    #[error("cursor is missing the '|' separator")]
    MissingSeparator,

    /// The timestamp half was not RFC 3339.
    #[error("cursor timestamp is invalid: {0}")]
    Timestamp(String),

    /// The id half was not a UUID.
    #[error("cursor id is invalid: {0}")]
    Id(String),
}

/// Position just after the last row delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    /// Timestamp of the last delivered row.
    pub created_at: DateTime<Utc>,
    /// Id of the last delivered row.
    pub id: Uuid,
}

impl Cursor {
    /// Cursor positioned at `event`.
    pub const fn after(event: &Event) -> Self {
        Self {
            created_at: event.created_at,
            id: event.id.into_inner(),
        }
    }

    /// Whether `event` sorts strictly after this cursor in newest-first order,
    /// i.e. is older than the cursor position.
    pub fn precedes(&self, event: &Event) -> bool {
        (event.created_at, event.id.into_inner()) < (self.created_at, self.id)
    }

    /// Encode as `<rfc3339>|<uuid>`. The timestamp keeps full nanosecond
    /// precision so rows inside one microsecond stay ordered.
    pub fn encode(&self) -> String {
        format!(
            "{}{CURSOR_SEPARATOR}{}",
            self.created_at.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
            self.id
        )
    }

    /// Decode the wire form produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns a [`CursorError`] describing which half failed to parse.
    pub fn decode(raw: &str) -> Result<Self, CursorError> {
        let (ts, id) = raw
            .split_once(CURSOR_SEPARATOR)
            .ok_or(CursorError::MissingSeparator)?;
        let created_at = DateTime::parse_from_rfc3339(ts)
            .map_err(|e| CursorError::Timestamp(e.to_string()))?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(id).map_err(|e| CursorError::Id(e.to_string()))?;
        Ok(Self { created_at, id })
    }
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`, defaulting to [`PAGE_SIZE`].
pub fn clamp_limit(requested: Option<u32>) -> u32 {
    requested.unwrap_or(PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// One page of events as served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventPage {
    /// Rows, newest first.
    pub events: Vec<Event>,
    /// Cursor for the next page, if more rows exist.
    pub next_cursor: Option<String>,
    /// Whether an older page exists.
    pub has_more: bool,
}

impl EventPage {
    /// Build a page from a fetch of up to `limit + 1` rows.
    ///
    /// The extra row, when present, only signals that more rows exist and is
    /// not returned.
    pub fn from_overfetch(mut rows: Vec<Event>, limit: u32) -> Self {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(|e| Cursor::after(e).encode())
        } else {
            None
        };
        Self {
            events: rows,
            next_cursor,
            has_more,
        }
    }
}

/// What happened when a page was offered to an [`EventPager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    /// Rows appended to the feed.
    pub accepted: usize,
    /// Rows dropped because they were already delivered or were not older
    /// than the current cursor.
    pub dropped: usize,
}

/// Client-side accumulator for an infinite event feed.
#[derive(Debug, Clone, Default)]
pub struct EventPager {
    events: Vec<Event>,
    seen: BTreeSet<EventId>,
    cursor: Option<Cursor>,
    next_cursor: Option<String>,
    exhausted: bool,
}

impl EventPager {
    /// An empty pager positioned at the newest row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every accumulated row, newest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The cursor of the oldest accepted row.
    pub const fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    /// The wire cursor to request the next page with.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    /// Whether another page may exist.
    pub const fn has_more(&self) -> bool {
        !self.exhausted
    }

    /// Number of accumulated rows.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Offer a page. Rows already delivered, or not strictly older than the
    /// current cursor, are dropped. The cursor only ever moves backwards.
    pub fn push_page(&mut self, page: EventPage) -> PageOutcome {
        let mut accepted: usize = 0;
        let mut dropped: usize = 0;

        for event in page.events {
            let older = self.cursor.is_none_or(|c| c.precedes(&event));
            if !older || self.seen.contains(&event.id) {
                dropped = dropped.saturating_add(1);
                continue;
            }
            self.cursor = Some(Cursor::after(&event));
            self.seen.insert(event.id);
            self.events.push(event);
            accepted = accepted.saturating_add(1);
        }

        if page.has_more && accepted > 0 {
            self.next_cursor = self.cursor.map(|c| c.encode());
        } else {
            self.exhausted = true;
            self.next_cursor = None;
        }

        PageOutcome { accepted, dropped }
    }

    /// Forget everything, e.g. when the selected world changes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use observatory_types::{EventType, WorldId};

    use super::*;

    fn event_at(secs_ago: i64) -> Event {
        Event {
            id: EventId::new(),
            world_id: WorldId::new(),
            turn_id: None,
            turn_number: None,
            agent_id: None,
            event_type: EventType::Action,
            title: format!("t-{secs_ago}"),
            content: String::new(),
            metadata: serde_json::Value::Null,
            created_at: base_time() - Duration::seconds(secs_ago),
        }
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_default()
    }

    #[test]
    fn cursor_encoding_round_trips() {
        let event = event_at(3);
        let cursor = Cursor::after(&event);
        assert_eq!(Cursor::decode(&cursor.encode()), Ok(cursor));
    }

    #[test]
    fn cursor_keeps_sub_microsecond_precision() {
        let mut newest = event_at(0);
        let mut older = event_at(0);
        newest.created_at = base_time()
            .checked_add_signed(Duration::nanoseconds(900))
            .unwrap_or_default();
        older.created_at = base_time()
            .checked_add_signed(Duration::nanoseconds(500))
            .unwrap_or_default();

        let decoded = Cursor::decode(&Cursor::after(&newest).encode());
        assert_eq!(decoded, Ok(Cursor::after(&newest)));
        assert!(decoded.is_ok_and(|c| c.precedes(&older)));
    }

    #[test]
    fn cursor_decode_errors() {
        assert_eq!(Cursor::decode("nope"), Err(CursorError::MissingSeparator));
        assert!(matches!(
            Cursor::decode("yesterday|00000000-0000-0000-0000-000000000000"),
            Err(CursorError::Timestamp(_))
        ));
        assert!(matches!(
            Cursor::decode("2026-01-01T00:00:00Z|xyz"),
            Err(CursorError::Id(_))
        ));
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(None), PAGE_SIZE);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(7)), 7);
    }

    #[test]
    fn overfetch_sets_has_more_and_cursor() {
        let rows = vec![event_at(1), event_at(2), event_at(3)];
        let last_kept = rows.get(1).map(Cursor::after);
        let page = EventPage::from_overfetch(rows, 2);
        assert_eq!(page.events.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.next_cursor, last_kept.map(|c| c.encode()));

        let page = EventPage::from_overfetch(vec![event_at(1)], 2);
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn pager_cursor_strictly_decreases_and_never_repeats() {
        let rows = vec![event_at(1), event_at(2), event_at(3)];
        let repeated = rows.get(1).cloned();
        let trimmed = rows.get(2).cloned();
        let mut pager = EventPager::new();

        let outcome = pager.push_page(EventPage::from_overfetch(rows, 2));
        assert_eq!(outcome.accepted, 2);
        let c1 = pager.cursor();

        // The next fetch re-sends the boundary row before the older ones.
        let mut second = Vec::new();
        second.extend(repeated);
        second.extend(trimmed);
        second.push(event_at(4));
        let outcome = pager.push_page(EventPage {
            events: second,
            next_cursor: None,
            has_more: false,
        });
        assert_eq!(outcome.accepted, 2);
        assert_eq!(outcome.dropped, 1);
        let c2 = pager.cursor();
        assert!(c2 < c1);

        let ids: BTreeSet<EventId> = pager.events().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), pager.len());
        assert_eq!(pager.len(), 4);
        assert!(!pager.has_more());
    }

    #[test]
    fn pager_drops_rows_not_older_than_cursor() {
        let mut pager = EventPager::new();
        pager.push_page(EventPage {
            events: vec![event_at(10)],
            next_cursor: None,
            has_more: true,
        });
        let outcome = pager.push_page(EventPage {
            events: vec![event_at(5), event_at(10)],
            next_cursor: None,
            has_more: true,
        });
        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.dropped, 2);
        assert_eq!(pager.len(), 1);
        // A page that contributes nothing ends the feed.
        assert!(!pager.has_more());
    }

    #[test]
    fn same_timestamp_rows_use_id_tiebreak() {
        let mut a = event_at(5);
        let mut b = event_at(5);
        a.id = EventId::from(Uuid::from_u128(2));
        b.id = EventId::from(Uuid::from_u128(1));
        let mut pager = EventPager::new();
        let outcome = pager.push_page(EventPage {
            events: vec![a, b],
            next_cursor: None,
            has_more: true,
        });
        assert_eq!(outcome.accepted, 2);
        assert_eq!(pager.cursor().map(|c| c.id), Some(Uuid::from_u128(1)));
    }

    #[test]
    fn reset_clears_state() {
        let mut pager = EventPager::new();
        pager.push_page(EventPage {
            events: vec![event_at(1)],
            next_cursor: None,
            has_more: false,
        });
        pager.reset();
        assert!(pager.is_empty());
        assert!(pager.has_more());
        assert!(pager.cursor().is_none());
    }
}
