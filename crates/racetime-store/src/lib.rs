//! Data layer for the RaceTime relay (Redis + `PostgreSQL`).
//!
//! Redis holds exactly one hot value, the live snapshot, written by the
//! poller and read by the API. `PostgreSQL` holds the durable event log.
//!
//! ```text
//! Poller --set--> LiveStore (Redis: live:snapshot) <--get-- API
//!                                                           |
//!                 EventLog (PostgreSQL: events) <--append---+
//! ```
//!
//! # Modules
//!
//! - [`live`] -- [`LiveStore`] trait and the Redis implementation
//! - [`memory`] -- In-process stores for tests and local runs
//! - [`postgres`] -- `PostgreSQL` connection pool and migrations
//! - [`event_store`] -- [`EventLog`] trait and the `PostgreSQL` implementation
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod live;
pub mod memory;
pub mod postgres;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use event_store::{EventLog, EventRow, PgEventLog};
pub use live::{LIVE_SNAPSHOT_KEY, LiveStore, RedisLiveStore, StoreSettings};
pub use memory::{MemoryEventLog, MemoryLiveStore};
pub use postgres::{PostgresConfig, PostgresPool};
