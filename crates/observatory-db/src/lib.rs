//! Read-only data layer for the Observatory.
//!
//! The simulation owns every table; this crate only selects from them.
//!
//! - [`postgres`]: connection pool management
//! - [`event_store`], [`world_store`], [`roster_store`], [`chronicle_store`]:
//!   parameterized queries, one store per group of tables
//! - [`rows`]: raw rows and their conversion into `observatory-types` records
//! - [`memory`]: an in-memory stand-in with identical ordering
//! - [`source`]: the [`DataSource`] the server reads through

pub mod chronicle_store;
pub mod error;
pub mod event_store;
pub mod memory;
pub mod postgres;
pub mod roster_store;
pub mod rows;
pub mod source;
pub mod world_store;

pub use chronicle_store::ChronicleStore;
pub use error::DbError;
pub use event_store::EventStore;
pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use roster_store::RosterStore;
pub use source::DataSource;
pub use world_store::WorldStore;
