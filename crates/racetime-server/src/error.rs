//! Error types for the API server binary.

/// Top-level error for the API server binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: racetime_core::ConfigError,
    },

    /// A store client or pool could not be built.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: racetime_store::StoreError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: racetime_api::ServerError,
    },
}
