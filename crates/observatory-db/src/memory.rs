//! In-memory data source.
//!
//! Holds the same records the Postgres stores read, behind a tokio
//! [`RwLock`]. Queries mirror the SQL ordering and filtering exactly so
//! the server can be exercised end to end without a database.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use observatory_core::pagination::{Cursor, EventPage};
use observatory_types::{
    Agent, AgentId, AgentStatus, Artifact, Briefing, Era, Event, EventId, EventType,
    LeaderboardEntry, Mood, PopulationSample, Quote, QuoteId, World, WorldId,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    worlds: Vec<World>,
    events: Vec<Event>,
    agents: Vec<Agent>,
    artifacts: Vec<Artifact>,
    briefings: Vec<Briefing>,
    eras: Vec<Era>,
    quotes: Vec<Quote>,
    moods: Vec<Mood>,
    leaderboard: Vec<LeaderboardEntry>,
    population: Vec<PopulationSample>,
}

/// Take the first `limit` items of an iterator into a `Vec`.
fn take_limit<T>(items: impl Iterator<Item = T>, limit: u32) -> Vec<T> {
    items
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}

/// Newest-first sort key shared by every table ordered on `created_at`.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
}

/// Shared in-memory tables. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Fixtures
    // -----------------------------------------------------------------------

    /// Insert or replace a world.
    pub async fn put_world(&self, world: World) {
        let mut tables = self.tables.write().await;
        tables.worlds.retain(|w| w.id != world.id);
        tables.worlds.push(world);
    }

    /// Append events.
    pub async fn push_events(&self, events: impl IntoIterator<Item = Event>) {
        self.tables.write().await.events.extend(events);
    }

    /// Append agents.
    pub async fn push_agents(&self, agents: impl IntoIterator<Item = Agent>) {
        self.tables.write().await.agents.extend(agents);
    }

    /// Append an artifact.
    pub async fn push_artifact(&self, artifact: Artifact) {
        self.tables.write().await.artifacts.push(artifact);
    }

    /// Append a briefing.
    pub async fn push_briefing(&self, briefing: Briefing) {
        self.tables.write().await.briefings.push(briefing);
    }

    /// Append an era.
    pub async fn push_era(&self, era: Era) {
        self.tables.write().await.eras.push(era);
    }

    /// Append a quote.
    pub async fn push_quote(&self, quote: Quote) {
        self.tables.write().await.quotes.push(quote);
    }

    /// Append a mood reading.
    pub async fn push_mood(&self, mood: Mood) {
        self.tables.write().await.moods.push(mood);
    }

    /// Append leaderboard rows.
    pub async fn push_leaderboard(&self, entries: impl IntoIterator<Item = LeaderboardEntry>) {
        self.tables.write().await.leaderboard.extend(entries);
    }

    /// Append population samples.
    pub async fn push_population(&self, samples: impl IntoIterator<Item = PopulationSample>) {
        self.tables.write().await.population.extend(samples);
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All worlds, newest first.
    pub async fn worlds(&self) -> Vec<World> {
        let mut worlds = self.tables.read().await.worlds.clone();
        newest_first(&mut worlds, |w| w.created_at);
        worlds
    }

    /// A single world.
    pub async fn world(&self, world_id: WorldId) -> Option<World> {
        self.tables
            .read()
            .await
            .worlds
            .iter()
            .find(|w| w.id == world_id)
            .cloned()
    }

    /// One page of events, newest first, strictly older than `cursor`.
    pub async fn event_page(
        &self,
        world_id: WorldId,
        cursor: Option<Cursor>,
        limit: u32,
        event_type: Option<EventType>,
    ) -> EventPage {
        let mut events: Vec<Event> = self
            .tables
            .read()
            .await
            .events
            .iter()
            .filter(|e| e.world_id == world_id)
            .filter(|e| event_type.is_none_or(|t| e.event_type == t))
            .filter(|e| cursor.is_none_or(|c| c.precedes(e)))
            .cloned()
            .collect();
        events.sort_by_key(|e| std::cmp::Reverse((e.created_at, e.id)));
        let rows = take_limit(events.into_iter(), limit.saturating_add(1));
        EventPage::from_overfetch(rows, limit)
    }

    /// A single event by id.
    pub async fn event(&self, world_id: WorldId, event_id: EventId) -> Option<Event> {
        self.tables
            .read()
            .await
            .events
            .iter()
            .find(|e| e.world_id == world_id && e.id == event_id)
            .cloned()
    }

    /// The most recent `limit` events.
    pub async fn recent_events(&self, world_id: WorldId, limit: u32) -> Vec<Event> {
        self.event_page(world_id, None, limit, None).await.events
    }

    /// The most recent `limit` events involving one agent.
    pub async fn agent_events(&self, world_id: WorldId, agent_id: AgentId, limit: u32) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .tables
            .read()
            .await
            .events
            .iter()
            .filter(|e| e.world_id == world_id && e.agent_id == Some(agent_id))
            .cloned()
            .collect();
        events.sort_by_key(|e| std::cmp::Reverse((e.created_at, e.id)));
        take_limit(events.into_iter(), limit)
    }

    /// Number of events at or after `since`.
    pub async fn count_events_since(&self, world_id: WorldId, since: DateTime<Utc>) -> u64 {
        let count = self
            .tables
            .read()
            .await
            .events
            .iter()
            .filter(|e| e.world_id == world_id && e.created_at >= since)
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    /// Agents, newest first, optionally filtered by status.
    pub async fn agents(&self, world_id: WorldId, status: Option<AgentStatus>) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self
            .tables
            .read()
            .await
            .agents
            .iter()
            .filter(|a| a.world_id == world_id)
            .filter(|a| status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        newest_first(&mut agents, |a| a.created_at);
        agents
    }

    /// The most recent `limit` artifacts.
    pub async fn artifacts(&self, world_id: WorldId, limit: u32) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = self
            .tables
            .read()
            .await
            .artifacts
            .iter()
            .filter(|a| a.world_id == world_id)
            .cloned()
            .collect();
        newest_first(&mut artifacts, |a| a.created_at);
        take_limit(artifacts.into_iter(), limit)
    }

    /// Every era, latest start turn first.
    pub async fn eras(&self, world_id: WorldId) -> Vec<Era> {
        let mut eras: Vec<Era> = self
            .tables
            .read()
            .await
            .eras
            .iter()
            .filter(|e| e.world_id == world_id)
            .cloned()
            .collect();
        eras.sort_by_key(|e| std::cmp::Reverse((e.start_turn, e.created_at)));
        eras
    }

    /// The most recent `limit` briefings.
    pub async fn briefings(&self, world_id: WorldId, limit: u32) -> Vec<Briefing> {
        let mut briefings: Vec<Briefing> = self
            .tables
            .read()
            .await
            .briefings
            .iter()
            .filter(|b| b.world_id == world_id)
            .cloned()
            .collect();
        newest_first(&mut briefings, |b| b.created_at);
        take_limit(briefings.into_iter(), limit)
    }

    /// The most recent `limit` quotes.
    pub async fn quotes(&self, world_id: WorldId, limit: u32) -> Vec<Quote> {
        let mut quotes: Vec<Quote> = self
            .tables
            .read()
            .await
            .quotes
            .iter()
            .filter(|q| q.world_id == world_id)
            .cloned()
            .collect();
        newest_first(&mut quotes, |q| q.created_at);
        take_limit(quotes.into_iter(), limit)
    }

    /// A single quote by id.
    pub async fn quote(&self, world_id: WorldId, quote_id: QuoteId) -> Option<Quote> {
        self.tables
            .read()
            .await
            .quotes
            .iter()
            .find(|q| q.world_id == world_id && q.id == quote_id)
            .cloned()
    }

    /// The latest mood reading.
    pub async fn latest_mood(&self, world_id: WorldId) -> Option<Mood> {
        self.tables
            .read()
            .await
            .moods
            .iter()
            .filter(|m| m.world_id == world_id)
            .max_by_key(|m| m.created_at)
            .cloned()
    }

    /// Leaderboard rows ordered by category then rank.
    pub async fn leaderboard(&self, world_id: WorldId, category: Option<&str>) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .tables
            .read()
            .await
            .leaderboard
            .iter()
            .filter(|e| e.world_id == world_id)
            .filter(|e| category.is_none_or(|c| e.category == c))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.category.cmp(&b.category).then(a.rank.cmp(&b.rank)));
        entries
    }

    /// Population samples for the last `limit` turns, ordered by turn.
    pub async fn population_history(&self, world_id: WorldId, limit: u32) -> Vec<PopulationSample> {
        let mut samples: Vec<PopulationSample> = self
            .tables
            .read()
            .await
            .population
            .iter()
            .filter(|s| s.world_id == world_id)
            .cloned()
            .collect();
        samples.sort_by_key(|s| std::cmp::Reverse((s.turn_number, s.created_at)));
        let mut recent = take_limit(samples.into_iter(), limit);
        recent.reverse();
        recent
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use chrono::{Duration, TimeZone};
    use observatory_types::WorldStatus;

    use super::*;

    fn world() -> World {
        World {
            id: WorldId::new(),
            name: "Ashfall".to_owned(),
            current_turn: 12,
            population: 3,
            status: WorldStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn event(world_id: WorldId, minute: i64, event_type: EventType) -> Event {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap_or_default();
        Event {
            id: EventId::new(),
            world_id,
            turn_id: None,
            turn_number: None,
            agent_id: None,
            event_type,
            title: format!("event {minute}"),
            content: String::new(),
            metadata: serde_json::json!({}),
            created_at: base
                .checked_add_signed(Duration::minutes(minute))
                .unwrap_or(base),
        }
    }

    #[tokio::test]
    async fn event_pages_walk_backwards_without_repeats() {
        let store = MemoryStore::new();
        let w = world();
        store.put_world(w.clone()).await;
        store
            .push_events((0..5).map(|m| event(w.id, m, EventType::Speech)))
            .await;

        let first = store.event_page(w.id, None, 2, None).await;
        assert_eq!(first.events.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.events[0].title, "event 4");

        let cursor = first.next_cursor.as_deref().and_then(|c| Cursor::decode(c).ok());
        let second = store.event_page(w.id, cursor, 2, None).await;
        assert_eq!(second.events[0].title, "event 2");

        let cursor = second.next_cursor.as_deref().and_then(|c| Cursor::decode(c).ok());
        let third = store.event_page(w.id, cursor, 2, None).await;
        assert_eq!(third.events.len(), 1);
        assert!(!third.has_more);
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn page_boundary_inside_one_microsecond_keeps_every_row() {
        let store = MemoryStore::new();
        let w = world();
        let base = event(w.id, 0, EventType::Speech).created_at;
        store
            .push_events([900, 500, 100].map(|ns| {
                let mut e = event(w.id, 0, EventType::Speech);
                e.title = format!("ns {ns}");
                e.created_at = base
                    .checked_add_signed(Duration::nanoseconds(ns))
                    .unwrap_or(base);
                e
            }))
            .await;

        let mut titles = Vec::new();
        let mut cursor = None;
        loop {
            let page = store.event_page(w.id, cursor, 1, None).await;
            titles.extend(page.events.iter().map(|e| e.title.clone()));
            cursor = page.next_cursor.as_deref().and_then(|c| Cursor::decode(c).ok());
            if cursor.is_none() {
                break;
            }
        }
        assert_eq!(titles, ["ns 900", "ns 500", "ns 100"]);
    }

    #[tokio::test]
    async fn point_lookups_are_scoped_to_the_world() {
        let store = MemoryStore::new();
        let w = world();
        let e = event(w.id, 3, EventType::Trade);
        let quote = Quote {
            id: QuoteId::new(),
            world_id: w.id,
            agent_id: None,
            agent_name: "Ada".to_owned(),
            text: "Hold the line.".to_owned(),
            turn_number: 3,
            created_at: Utc::now(),
        };
        store.push_events([e.clone()]).await;
        store.push_quote(quote.clone()).await;

        assert_eq!(store.event(w.id, e.id).await, Some(e.clone()));
        assert_eq!(store.event(WorldId::new(), e.id).await, None);
        assert_eq!(store.event(w.id, EventId::new()).await, None);
        assert_eq!(store.quote(w.id, quote.id).await, Some(quote.clone()));
        assert_eq!(store.quote(WorldId::new(), quote.id).await, None);
    }

    #[tokio::test]
    async fn event_type_filter_applies() {
        let store = MemoryStore::new();
        let w = world();
        store
            .push_events([
                event(w.id, 0, EventType::Speech),
                event(w.id, 1, EventType::Conflict),
                event(WorldId::new(), 2, EventType::Conflict),
            ])
            .await;

        let page = store.event_page(w.id, None, 20, Some(EventType::Conflict)).await;
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].title, "event 1");
    }

    #[tokio::test]
    async fn put_world_replaces_existing() {
        let store = MemoryStore::new();
        let mut w = world();
        store.put_world(w.clone()).await;
        w.population = 99;
        store.put_world(w.clone()).await;
        assert_eq!(store.worlds().await.len(), 1);
        assert_eq!(store.world(w.id).await.map(|w| w.population), Some(99));
    }

    #[tokio::test]
    async fn population_history_keeps_latest_turns_ascending() {
        let store = MemoryStore::new();
        let w = world();
        store
            .push_population((1..=5).map(|turn| PopulationSample {
                world_id: w.id,
                turn_number: turn,
                population: turn * 10,
                created_at: Utc::now(),
            }))
            .await;
        let turns: Vec<u64> = store
            .population_history(w.id, 3)
            .await
            .iter()
            .map(|s| s.turn_number)
            .collect();
        assert_eq!(turns, vec![3, 4, 5]);
    }
}
