//! Error types for the poller binary.

/// Top-level error for the poller binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: racetime_core::ConfigError,
    },

    /// The store client could not be built.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: racetime_store::StoreError,
    },

    /// The poll loop could not start.
    #[error("poller error: {source}")]
    Poller {
        /// The underlying poller error.
        #[from]
        source: racetime_core::PollerError,
    },
}
