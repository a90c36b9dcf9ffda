//! Infinite event feed for one world.
//!
//! [`EventFeed`] pairs the [`ApiClient`] with an [`EventPager`]: each
//! [`load_more`](EventFeed::load_more) fetches the page after the oldest
//! row seen so far, retrying transient failures with backoff. The pager
//! drops repeated rows, so a retried request that races a refresh never
//! shows an event twice.

use observatory_core::pagination::{EventPager, PAGE_SIZE, PageOutcome};
use observatory_core::retry::{RetryPolicy, retry};
use observatory_types::{Event, EventType, WorldId};

use crate::api::{ApiClient, EventQuery};
use crate::error::ClientError;

/// Paged, de-duplicated event history for one world.
#[derive(Debug, Clone)]
pub struct EventFeed {
    api: ApiClient,
    world_id: WorldId,
    event_type: Option<EventType>,
    page_size: u32,
    retry: RetryPolicy,
    pager: EventPager,
}

impl EventFeed {
    /// Empty feed for `world_id` with the default page size and retry policy.
    pub fn new(api: ApiClient, world_id: WorldId) -> Self {
        Self {
            api,
            world_id,
            event_type: None,
            page_size: PAGE_SIZE,
            retry: RetryPolicy::default(),
            pager: EventPager::new(),
        }
    }

    /// Use `policy` for page fetches.
    #[must_use]
    pub const fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Request `page_size` rows per page.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// The world being followed.
    pub const fn world_id(&self) -> WorldId {
        self.world_id
    }

    /// Rows loaded so far, newest first.
    pub fn events(&self) -> &[Event] {
        self.pager.events()
    }

    /// Whether an older page may exist.
    pub const fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    /// Follow another world. Loaded rows are discarded.
    pub fn switch_world(&mut self, world_id: WorldId) {
        if world_id != self.world_id {
            self.world_id = world_id;
            self.pager.reset();
        }
    }

    /// Restrict the feed to one event type, or clear the filter. Loaded
    /// rows are discarded when the filter changes.
    pub fn set_event_type(&mut self, event_type: Option<EventType>) {
        if event_type != self.event_type {
            self.event_type = event_type;
            self.pager.reset();
        }
    }

    /// Drop everything and start again from the newest row.
    pub fn reset(&mut self) {
        self.pager.reset();
    }

    /// Fetch the next older page.
    ///
    /// Returns an empty outcome without a request once the history is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns the last [`ClientError`] once retries run out. Loaded rows
    /// are kept.
    pub async fn load_more(&mut self) -> Result<PageOutcome, ClientError> {
        if !self.pager.has_more() {
            return Ok(PageOutcome {
                accepted: 0,
                dropped: 0,
            });
        }

        let query = EventQuery {
            cursor: self.pager.next_cursor().map(str::to_owned),
            limit: Some(self.page_size),
            event_type: self.event_type,
        };
        let api = &self.api;
        let query = &query;
        let world_id = self.world_id;
        let page = retry(self.retry, ClientError::is_retryable, || {
            api.events(world_id, query)
        })
        .await?;

        let outcome = self.pager.push_page(page);
        tracing::debug!(
            world_id = %self.world_id,
            accepted = outcome.accepted,
            dropped = outcome.dropped,
            total = self.pager.len(),
            "event page loaded"
        );
        Ok(outcome)
    }
}
