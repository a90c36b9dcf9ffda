//! Client for the Observatory API.
//!
//! - [`ApiClient`] -- one typed method per endpoint
//! - [`EventFeed`] -- cursor-paged, de-duplicated event history with retry
//! - [`AdminAuth`] -- admin login persisted to a session file
//! - [`StatsPoller`] -- background dashboard polling, latest value wins
//!
//! Reads that fail transiently are retried with
//! [`RetryPolicy`](observatory_core::retry::RetryPolicy). Authentication
//! failures never are.

pub mod api;
pub mod auth;
pub mod error;
pub mod feed;
pub mod poller;

pub use api::{AdminAck, AdminStatus, ApiClient, EventQuery, Health, SharedCard, WorldList};
pub use auth::AdminAuth;
pub use error::ClientError;
pub use feed::EventFeed;
pub use poller::{STATS_POLL_INTERVAL, StatsPoller};
