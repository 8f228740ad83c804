//! Error types for the data layer.
//!
//! All errors are propagated via [`StoreError`] which wraps the underlying
//! [`fred`] and [`sqlx`] errors. An absent snapshot is *not* an error; see
//! [`LiveStore::get`](crate::LiveStore::get).

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A Redis/Dragonfly command failed.
    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A store operation did not complete within its deadline.
    #[error("Timed out after {timeout_ms}ms: {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline that was exceeded.
        timeout_ms: u128,
    },

    /// A record with the same id already exists.
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// The store is not reachable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether this error indicates the backend could not be reached,
    /// as opposed to a bad value or bad configuration.
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Redis(_) | Self::Postgres(_) | Self::Timeout { .. } | Self::Unavailable(_)
        )
    }
}
