//! Poll loop: generate a snapshot, publish it, sleep, repeat.
//!
//! ```text
//! Starting --(store reachable?)--> Running <-> (tick, publish) --> Stopping --> Stopped
//!     |                                                                   ^
//!     +-------------------------(store unreachable)----------------------+
//! ```
//!
//! A failed tick (generation or publish) is logged and counted; the loop
//! carries on at the next interval. The interval is a plain sleep after
//! each tick with no drift compensation, so the effective period is
//! `interval + tick duration`.
//!
//! Shutdown is driven by a [`CancellationToken`], checked at tick
//! boundaries. A tick in progress always completes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use racetime_store::{LiveStore, StoreError};
use racetime_types::Snapshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::feed::{FeedError, SnapshotSource};

/// Lifecycle phase of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
    /// Checking the store before the first tick.
    Starting,
    /// Ticking on the interval.
    Running,
    /// Releasing the store connection.
    Stopping,
    /// Finished.
    Stopped,
}

impl fmt::Display for PollerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Timing parameters for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    /// Sleep between ticks.
    pub interval: Duration,
    /// Stop after this many ticks (0 = run until cancelled).
    pub max_ticks: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_ticks: 0,
        }
    }
}

/// Why a single tick failed.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The source could not produce a snapshot.
    #[error("generation failed: {source}")]
    Generate {
        /// The underlying feed error.
        #[from]
        source: FeedError,
    },

    /// The snapshot could not be written to the store.
    #[error("publish failed: {source}")]
    Publish {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// Fatal poller errors.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    /// The store did not answer the startup probe.
    #[error("store unreachable at startup")]
    StoreUnreachable,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Ticks attempted.
    pub ticks: u64,
    /// Ticks whose snapshot was written to the store.
    pub published: u64,
    /// Ticks that failed to generate or publish.
    pub failed: u64,
}

/// Drives a [`SnapshotSource`] into a [`LiveStore`] on a fixed interval.
pub struct Poller<S> {
    store: Arc<dyn LiveStore>,
    source: S,
    settings: PollerSettings,
    phase: PollerPhase,
}

impl<S: SnapshotSource> Poller<S> {
    /// Create a poller in the [`PollerPhase::Starting`] phase.
    pub fn new(store: Arc<dyn LiveStore>, source: S, settings: PollerSettings) -> Self {
        Self {
            store,
            source,
            settings,
            phase: PollerPhase::Starting,
        }
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> PollerPhase {
        self.phase
    }

    /// The snapshot source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    fn transition(&mut self, next: PollerPhase) {
        info!(from = %self.phase, to = %next, "Poller phase change");
        self.phase = next;
    }

    /// Generate and publish one snapshot. Returns the published snapshot.
    pub async fn tick(&mut self, tick: u64) -> Result<Snapshot, TickError> {
        let snapshot = self.source.next_snapshot(tick)?;
        self.store.set(&snapshot).await?;
        Ok(snapshot)
    }

    /// Run until `shutdown` fires or the tick limit is reached.
    ///
    /// The store connection is released before returning, on every path.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::StoreUnreachable`] if the startup probe fails.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<PollReport, PollerError> {
        info!(
            interval_secs = self.settings.interval.as_secs_f64(),
            max_ticks = self.settings.max_ticks,
            "Starting poller"
        );

        if !self.store.ping().await {
            error!("Cannot connect to store, exiting");
            self.store.close().await;
            self.transition(PollerPhase::Stopped);
            return Err(PollerError::StoreUnreachable);
        }

        info!("Store connected, starting poll loop");
        self.transition(PollerPhase::Running);

        let mut report = PollReport::default();
        let mut tick: u64 = 0;

        while !shutdown.is_cancelled() {
            match self.tick(tick).await {
                Ok(snapshot) => {
                    report.published = report.published.saturating_add(1);
                    let leader = snapshot.leader().map_or("-", |e| e.driver_code.as_str());
                    info!(tick, timestamp = %snapshot.timestamp, leader, "Wrote snapshot");
                }
                Err(e) => {
                    report.failed = report.failed.saturating_add(1);
                    error!(tick, error = %e, "Tick failed");
                }
            }

            report.ticks = report.ticks.saturating_add(1);
            tick = tick.saturating_add(1);

            if self.settings.max_ticks > 0 && report.ticks >= self.settings.max_ticks {
                info!(max_ticks = self.settings.max_ticks, "Tick limit reached");
                break;
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        self.transition(PollerPhase::Stopping);
        self.store.close().await;
        self.transition(PollerPhase::Stopped);

        info!(
            ticks = report.ticks,
            published = report.published,
            failed = report.failed,
            "Poll loop stopped"
        );
        Ok(report)
    }
}
