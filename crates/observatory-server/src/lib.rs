//! Observatory API server.
//!
//! A read-only HTTP view over a running simulation's `PostgreSQL` records:
//!
//! - **Read API** (`/api/worlds/...`) for worlds, paged events, agents,
//!   eras, briefings, quotes, mood, leaderboard, tension, and share cards
//! - **Dashboard cache** rebuilt by a background refresher at the polling
//!   interval, served from `/api/worlds/:id/dashboard`
//! - **Backend functions** (`/functions/...`) for admin password checks
//!   and plain-language event summaries
//! - **Admin API** (`/api/admin/...`) to pause, resume, or force the
//!   refresher, gated by tokens from the password function
//! - **Minimal HTML page** (`GET /`) listing cached worlds
//!
//! # Architecture
//!
//! Handlers read through [`DataSource`](observatory_db::DataSource), which
//! is either a `PostgreSQL` pool or an in-memory store for tests. Only the
//! dashboard is cached; everything else is a live query. A failed refresh
//! keeps the previous cache.

pub mod admin;
pub mod error;
pub mod functions;
pub mod handlers;
pub mod llm;
pub mod prompt;
pub mod refresher;
pub mod router;
pub mod server;
pub mod sessions;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve_on, start_server};
pub use startup::{ObservatoryHandle, StartupError, spawn_observatory};
pub use state::AppState;
