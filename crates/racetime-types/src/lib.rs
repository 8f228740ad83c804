//! Shared type definitions for the RaceTime relay.
//!
//! Types defined here flow between the poller, the shared store, the API
//! and (via `ts-rs`) the `TypeScript` dashboard.
//!
//! # Modules
//!
//! - [`snapshot`] -- Live snapshot payload (positions, leaderboard, session)
//! - [`events`] -- Event ingestion envelope and stored record
//! - [`ids`] -- Type-safe UUID wrappers

pub mod events;
pub mod ids;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use events::{EventPayload, EventRecord, NewEvent};
pub use ids::EventId;
pub use snapshot::{DriverNumber, DriverPosition, LeaderboardEntry, SessionInfo, Snapshot};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::EventId::export_all();
        let _ = crate::snapshot::DriverPosition::export_all();
        let _ = crate::snapshot::LeaderboardEntry::export_all();
        let _ = crate::snapshot::SessionInfo::export_all();
        let _ = crate::snapshot::Snapshot::export_all();
        let _ = crate::events::NewEvent::export_all();
        let _ = crate::events::EventRecord::export_all();
    }
}
