//! Live snapshot store over Redis (or any Redis-compatible server such as
//! `Dragonfly`).
//!
//! Exactly one logical key is used:
//!
//! | Key | Type | Description |
//! |-----|------|-------------|
//! | `live:snapshot` | JSON | The latest [`Snapshot`], overwritten every tick |
//!
//! The poller is the only writer, so a plain `SET` (last writer wins) is
//! enough. Readers see either the previous or the new snapshot, never a mix.

use std::time::Duration;

use async_trait::async_trait;
use fred::prelude::*;
use racetime_types::Snapshot;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Key holding the live snapshot.
pub const LIVE_SNAPSHOT_KEY: &str = "live:snapshot";

/// Default Redis URL when none is configured.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Default connect and command timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Narrow interface over the shared store holding the live snapshot.
///
/// Implementations are constructed once per process, shared behind an
/// [`Arc`](std::sync::Arc), and must be safe for concurrent use.
#[async_trait]
pub trait LiveStore: Send + Sync {
    /// Liveness probe. Returns `false` on any connectivity failure and
    /// never returns an error.
    async fn ping(&self) -> bool;

    /// Overwrite the live snapshot.
    async fn set(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Read the live snapshot.
    ///
    /// Returns `Ok(None)` if no snapshot has been written yet. Connectivity
    /// and decoding failures are returned as errors.
    async fn get(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Release the underlying connection. Safe to call more than once; the
    /// next operation reconnects transparently.
    async fn close(&self);
}

/// Connection parameters for [`RedisLiveStore`].
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Redis URL: `redis://host:port` or `redis://host:port/db`.
    pub url: String,
    /// Maximum time to establish a connection.
    pub connect_timeout: Duration,
    /// Maximum time for a single command round trip.
    pub command_timeout: Duration,
}

impl StoreSettings {
    /// Settings for the given URL with the default 2 s timeouts.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            connect_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            command_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-command timeout.
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::new(DEFAULT_REDIS_URL)
    }
}

/// Redis-backed [`LiveStore`] with a lazily opened connection.
///
/// The URL is validated at construction but no connection is made until
/// the first operation. A closed or dropped connection is rebuilt on the
/// next operation. Commands are never retried; the poll interval is the
/// retry cadence.
pub struct RedisLiveStore {
    config: Config,
    connect_timeout: Duration,
    command_timeout: Duration,
    client: Mutex<Option<Client>>,
}

impl RedisLiveStore {
    /// Create a store for the given settings without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    pub fn new(settings: &StoreSettings) -> Result<Self, StoreError> {
        let config = Config::from_url(&settings.url)
            .map_err(|e| StoreError::Config(format!("Invalid Redis URL: {e}")))?;

        Ok(Self {
            config,
            connect_timeout: settings.connect_timeout,
            command_timeout: settings.command_timeout,
            client: Mutex::new(None),
        })
    }

    /// Whether a connection is currently held.
    pub async fn is_open(&self) -> bool {
        self.client
            .lock()
            .await
            .as_ref()
            .is_some_and(ClientLike::is_connected)
    }

    /// Return the live client, connecting first if needed.
    ///
    /// The slot lock is held only to read or install a client, never across
    /// a connect, so callers racing against a hung backend each wait at most
    /// one connect timeout. If two callers connect at once, the first client
    /// installed wins and the other is shut down.
    async fn active_client(&self) -> Result<Client, StoreError> {
        if let Some(client) = self.current_client().await {
            return Ok(client);
        }

        let fresh = self.connect().await?;

        let mut slot = self.client.lock().await;
        if let Some(existing) = slot.as_ref().filter(|c| c.is_connected()).cloned() {
            drop(slot);
            if let Err(e) = fresh.quit().await {
                tracing::debug!(error = %e, "Redis quit of redundant connection failed");
            }
            return Ok(existing);
        }
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    /// The installed client, if it is still connected.
    async fn current_client(&self) -> Option<Client> {
        let slot = self.client.lock().await;
        match slot.as_ref() {
            Some(client) if client.is_connected() => Some(client.clone()),
            Some(_) => {
                tracing::debug!("Redis connection lost, reconnecting");
                None
            }
            None => None,
        }
    }

    async fn connect(&self) -> Result<Client, StoreError> {
        let connect_timeout = self.connect_timeout;
        let mut builder = Builder::from_config(self.config.clone());
        builder.with_connection_config(|config| {
            config.connection_timeout = connect_timeout;
            config.max_command_attempts = 1;
        });
        let client = builder.build()?;

        match tokio::time::timeout(connect_timeout, client.init()).await {
            Ok(Ok(_connection_task)) => {
                tracing::info!("Connected to Redis");
                Ok(client)
            }
            Ok(Err(e)) => Err(StoreError::Redis(e)),
            Err(_elapsed) => Err(StoreError::Timeout {
                operation: "connect",
                timeout_ms: connect_timeout.as_millis(),
            }),
        }
    }

    /// Run one command against the live client, bounded by the command timeout.
    async fn with_client<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(Client) -> Fut + Send,
        Fut: Future<Output = Result<T, fred::error::Error>> + Send,
    {
        let client = self.active_client().await?;
        match tokio::time::timeout(self.command_timeout, f(client)).await {
            Ok(result) => Ok(result?),
            Err(_elapsed) => Err(StoreError::Timeout {
                operation,
                timeout_ms: self.command_timeout.as_millis(),
            }),
        }
    }
}

#[async_trait]
impl LiveStore for RedisLiveStore {
    async fn ping(&self) -> bool {
        let result = self
            .with_client("ping", |client| async move {
                let _: () = client.ping(None).await?;
                Ok(())
            })
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Redis ping failed");
                false
            }
        }
    }

    async fn set(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;
        self.with_client("set", |client| async move {
            let _: () = client
                .set(LIVE_SNAPSHOT_KEY, json.as_str(), None, None, false)
                .await?;
            Ok(())
        })
        .await
    }

    async fn get(&self) -> Result<Option<Snapshot>, StoreError> {
        let value: Option<String> = self
            .with_client("get", |client| async move { client.get(LIVE_SNAPSHOT_KEY).await })
            .await?;

        value
            .map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    async fn close(&self) {
        let client = self.client.lock().await.take();
        if let Some(client) = client {
            if let Err(e) = client.quit().await {
                tracing::debug!(error = %e, "Redis quit failed");
            }
            tracing::info!("Redis connection closed");
        }
    }
}
