//! Poller binary for the RaceTime relay.
//!
//! Publishes a fresh snapshot to the shared store on a fixed interval
//! until Ctrl-C or SIGTERM.
//!
//! # Startup Sequence
//!
//! 1. Load `.env` (if present) and environment configuration
//! 2. Initialize structured logging (tracing)
//! 3. Build the Redis client (no connection yet)
//! 4. Install the signal listener
//! 5. Run the poll loop; it exits early if the store is unreachable

mod error;

use std::sync::Arc;

use racetime_core::{Poller, RelayConfig, SimulatedFeed, logging, shutdown};
use racetime_store::RedisLiveStore;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;

/// Application entry point for the poller.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the store is
/// unreachable at startup.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = RelayConfig::from_env().map_err(AppError::from)?;
    logging::init_tracing(config.log_format);

    info!(
        redis_url = %config.redis_url,
        interval_secs = config.poll_interval.as_secs_f64(),
        max_ticks = config.max_ticks,
        "racetime-poller starting"
    );

    let store = Arc::new(RedisLiveStore::new(&config.store_settings()).map_err(AppError::from)?);

    let shutdown = CancellationToken::new();
    let signals = shutdown::spawn_listener(&shutdown);

    let mut poller = Poller::new(store, SimulatedFeed::default(), config.poller_settings());
    let result = poller.run(shutdown.clone()).await;

    shutdown.cancel();
    signals.await.ok();

    let report = result.map_err(AppError::from)?;
    info!(
        ticks = report.ticks,
        published = report.published,
        failed = report.failed,
        "racetime-poller exiting"
    );
    Ok(())
}
