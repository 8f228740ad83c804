//! Snapshot generation, the poll loop, and process plumbing for the
//! RaceTime relay.
//!
//! ```text
//! SimulatedFeed (SnapshotGenerator + PositionState)
//!        |
//!        v  next_snapshot(tick)
//!     Poller --set--> LiveStore
//!        ^
//!        |  CancellationToken
//!   shutdown::listen (Ctrl-C / SIGTERM)
//! ```
//!
//! # Modules
//!
//! - [`generator`] -- Deterministic position simulator
//! - [`feed`] -- [`SnapshotSource`] trait and the simulated feed
//! - [`poller`] -- Fixed-interval publish loop
//! - [`config`] -- Environment configuration
//! - [`logging`] -- Tracing subscriber setup
//! - [`shutdown`] -- Signal handling

pub mod config;
pub mod feed;
pub mod generator;
pub mod logging;
pub mod poller;
pub mod shutdown;

pub use config::{ConfigError, LogFormat, RelayConfig};
pub use feed::{FeedError, SimulatedFeed, SnapshotSource};
pub use generator::{PositionState, SnapshotGenerator};
pub use poller::{PollReport, Poller, PollerError, PollerPhase, PollerSettings, TickError};
