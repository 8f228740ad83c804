//! Snapshot sources driven by the poller.
//!
//! The [`SnapshotSource`] trait abstracts over where a tick's snapshot comes
//! from. In this phase the only production source is [`SimulatedFeed`],
//! which owns the generator and its position state.

use chrono::Utc;
use racetime_types::Snapshot;

use crate::generator::{PositionState, SnapshotGenerator};

/// Errors a snapshot source can report for a single tick.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Upstream data could not be obtained for this tick.
    #[error("feed unavailable: {0}")]
    Unavailable(String),

    /// Upstream data was obtained but could not be turned into a snapshot.
    #[error("invalid feed data: {0}")]
    Invalid(String),
}

/// Produces one snapshot per tick.
///
/// Called only from the poller's single control flow, so implementations
/// may hold mutable state without synchronization.
pub trait SnapshotSource: Send {
    /// Produce the snapshot for `tick`.
    fn next_snapshot(&mut self, tick: u64) -> Result<Snapshot, FeedError>;
}

/// Deterministic simulator: the generator plus its owned position state.
#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    generator: SnapshotGenerator,
    state: PositionState,
}

impl SimulatedFeed {
    /// Simulator over the given generator, starting unseeded.
    pub fn new(generator: SnapshotGenerator) -> Self {
        Self {
            generator,
            state: PositionState::new(),
        }
    }

    /// Current position state.
    pub const fn state(&self) -> &PositionState {
        &self.state
    }
}

impl Default for SimulatedFeed {
    fn default() -> Self {
        Self::new(SnapshotGenerator::simulated())
    }
}

impl SnapshotSource for SimulatedFeed {
    fn next_snapshot(&mut self, tick: u64) -> Result<Snapshot, FeedError> {
        Ok(self.generator.generate(tick, &mut self.state, Utc::now()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn simulated_feed_seeds_on_first_tick() {
        let mut feed = SimulatedFeed::default();
        assert!(!feed.state().is_seeded());

        let snapshot = feed.next_snapshot(0).unwrap();
        assert!(feed.state().is_seeded());
        assert_eq!(snapshot.positions.len(), 20);
        assert!(snapshot.timestamp.ends_with('Z'));
    }

    #[test]
    fn simulated_feed_keeps_state_between_ticks() {
        let mut feed = SimulatedFeed::default();
        let first = feed.next_snapshot(0).unwrap();
        let second = feed.next_snapshot(1).unwrap();
        let a = first.position_of(1).unwrap();
        let b = second.position_of(1).unwrap();
        assert!((b.x_norm - a.x_norm - 0.0021).abs() < 1e-3);
    }
}
