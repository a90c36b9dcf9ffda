//! Dashboard logic for the Observatory.
//!
//! Everything in this crate is pure or nearly so: heuristics over rows
//! that were already fetched, plus the small pieces of client state the
//! dashboard needs to page, retry, and remember an admin login.
//!
//! # Modules
//!
//! - [`config`] -- `observatory-config.yaml` loading with env overrides
//! - [`dashboard`] -- The cached per-world dashboard snapshot
//! - [`charts`] -- Activity, population, and belief series
//! - [`handle`] -- Social handle validation
//! - [`pagination`] -- Timestamp cursors and the [`EventPager`]
//! - [`refresh`] -- Shared control state for the dashboard refresher
//! - [`retry`] -- Capped exponential backoff
//! - [`session`] -- Admin session record and its file-backed store
//! - [`share`] -- Shareable cards
//! - [`tension`] -- Keyword tension meter
//!
//! [`EventPager`]: pagination::EventPager

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod handle;
pub mod pagination;
pub mod refresh;
pub mod retry;
pub mod session;
pub mod share;
pub mod tension;

pub use config::{ConfigError, ObservatoryConfig};
pub use dashboard::{DashboardInputs, DashboardSnapshot, DashboardStats};
pub use pagination::{Cursor, EventPage, EventPager, MAX_PAGE_SIZE, PAGE_SIZE};
pub use refresh::{RefreshControl, RefreshStatus};
pub use retry::{RetryPolicy, retry};
pub use session::{AdminSession, SessionStore};
pub use tension::{TensionLevel, TensionReading, score_events};
