//! HTTP API for the RaceTime relay.
//!
//! Serves the latest live snapshot written by the poller and accepts
//! free-form events into the durable event log.
//!
//! ```text
//! GET  /health          -> {"status": "ok"|"degraded", "redis": "ok"|"down"}
//! GET  /live/snapshot   -> Snapshot | 503 {"error": "no snapshot yet"}
//! POST /events          -> 202 {"status": "accepted", "event_type", "id"}
//! GET  /events?limit=N  -> {"count", "events"}
//! ```
//!
//! Every route is also mounted under `/api`. Handlers never write to the
//! live store.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
