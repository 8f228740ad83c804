//! Axum router construction.
//!
//! The same route table is mounted at the root and under `/api`, so
//! `/live/snapshot` and `/api/live/snapshot` are interchangeable.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Routes without a prefix.
fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/live/snapshot", get(handlers::live_snapshot))
        .route(
            "/events",
            get(handlers::list_events).post(handlers::ingest_event),
        )
}

/// Build the complete router.
///
/// CORS allows any origin so browser dashboards can poll the snapshot.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
