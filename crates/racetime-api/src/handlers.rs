//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! Every route is served both at the root and under `/api`.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Store reachability probe |
//! | `GET` | `/live/snapshot` | Latest published snapshot |
//! | `POST` | `/events` | Ingest one event |
//! | `GET` | `/events` | Most recent events, newest first |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use racetime_types::{EventRecord, NewEvent, Snapshot};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Default page size for `GET /events`.
pub const DEFAULT_EVENTS_LIMIT: i64 = 50;

/// Largest page size `GET /events` will return.
pub const MAX_EVENTS_LIMIT: i64 = 500;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `ok` when every dependency answers, otherwise `degraded`.
    pub status: &'static str,
    /// `ok` or `down`.
    pub redis: &'static str,
}

/// Query parameters for `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Page size, clamped to `1..=500` (default 50).
    pub limit: Option<i64>,
}

impl EventsQuery {
    /// The effective page size.
    pub fn effective_limit(&self) -> u32 {
        let clamped = self
            .limit
            .unwrap_or(DEFAULT_EVENTS_LIMIT)
            .clamp(1, MAX_EVENTS_LIMIT);
        u32::try_from(clamped).unwrap_or(1)
    }
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Probe the live store. Always 200; the body reports reachability.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let reachable = state.store.ping().await;
    Json(HealthResponse {
        status: if reachable { "ok" } else { "degraded" },
        redis: if reachable { "ok" } else { "down" },
    })
}

// ---------------------------------------------------------------------------
// GET /live/snapshot
// ---------------------------------------------------------------------------

/// Return the latest snapshot verbatim, or 503 before the first publish.
pub async fn live_snapshot(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>, ApiError> {
    let snapshot = state.store.get().await?.ok_or(ApiError::NoSnapshot)?;
    Ok(Json(snapshot))
}

// ---------------------------------------------------------------------------
// POST /events
// ---------------------------------------------------------------------------

/// Accept one event into the log.
///
/// Responds 202 with `{"status": "accepted", "event_type": ..., "id": ...}`.
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let log = state.events.as_ref().ok_or(ApiError::EventsDisabled)?;

    let Json(event) = body.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    event.validate().map_err(ApiError::InvalidRequest)?;

    let record = EventRecord::accept(event, Utc::now());
    log.append(&record).await?;

    info!(
        id = %record.id,
        source = %record.source,
        event_type = %record.event_type,
        timestamp = %record.timestamp.to_rfc3339(),
        "event_received"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "accepted",
            "event_type": record.event_type,
            "id": record.id,
        })),
    ))
}

// ---------------------------------------------------------------------------
// GET /events
// ---------------------------------------------------------------------------

/// List the most recent events, newest first.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let log = state.events.as_ref().ok_or(ApiError::EventsDisabled)?;
    let Query(params) = query.map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))?;
    let events = log.recent(params.effective_limit()).await?;

    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_limit_defaults_and_clamps() {
        assert_eq!(EventsQuery { limit: None }.effective_limit(), 50);
        assert_eq!(EventsQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(EventsQuery { limit: Some(-7) }.effective_limit(), 1);
        assert_eq!(EventsQuery { limit: Some(20) }.effective_limit(), 20);
        assert_eq!(EventsQuery { limit: Some(10_000) }.effective_limit(), 500);
    }
}
