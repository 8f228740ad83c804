//! API server binary for the RaceTime relay.
//!
//! Serves the live snapshot from Redis and, when a database is configured,
//! the event ingestion endpoints backed by `PostgreSQL`.
//!
//! # Startup Sequence
//!
//! 1. Load `.env` (if present) and environment configuration
//! 2. Initialize structured logging (tracing)
//! 3. Build the Redis client and probe it (a failed probe is not fatal)
//! 4. Build the lazy `PostgreSQL` pool and run migrations, if configured
//! 5. Serve HTTP until Ctrl-C or SIGTERM
//! 6. Close the store and the pool

mod error;

use std::sync::Arc;

use racetime_api::{AppState, ServerConfig, start_server};
use racetime_core::{RelayConfig, logging, shutdown};
use racetime_store::{LiveStore, PgEventLog, PostgresPool, RedisLiveStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::AppError;

/// Application entry point for the API server.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = RelayConfig::from_env().map_err(AppError::from)?;
    logging::init_tracing(config.log_format);

    info!(
        redis_url = %config.redis_url,
        bind = %config.bind_addr(),
        "racetime-server starting"
    );

    let store = Arc::new(RedisLiveStore::new(&config.store_settings()).map_err(AppError::from)?);
    if !store.ping().await {
        warn!("Store unreachable at startup, health will report degraded");
    }

    let mut state = AppState::new(store.clone());
    let pool = match config.postgres_config() {
        Some(pg) => {
            let pool = PostgresPool::connect_lazy(&pg).map_err(AppError::from)?;
            if let Err(e) = pool.run_migrations().await {
                warn!(error = %e, "Migrations failed, event writes may fail until the database is ready");
            }
            state = state.with_events(Arc::new(PgEventLog::new(pool.pool().clone())));
            Some(pool)
        }
        None => {
            info!("No database configured, event endpoints disabled");
            None
        }
    };

    let shutdown = CancellationToken::new();
    let signals = shutdown::spawn_listener(&shutdown);

    let server_config = ServerConfig {
        host: config.api_host.clone(),
        port: config.api_port,
    };
    let result = start_server(&server_config, Arc::new(state), shutdown.clone()).await;

    shutdown.cancel();
    signals.await.ok();

    store.close().await;
    if let Some(pool) = pool {
        pool.close().await;
    }

    result.map_err(AppError::from)?;
    info!("racetime-server exiting");
    Ok(())
}
