//! Durable event log.
//!
//! Insert-and-list over the `events` table. Ids are generated by the relay
//! (UUID v7), so uniqueness of `id` is the only invariant the table enforces.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use racetime_types::{EventId, EventPayload, EventRecord};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;

/// Append-only log of ingested events.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Persist one accepted event.
    ///
    /// Returns [`StoreError::Duplicate`] if an event with the same id exists.
    async fn append(&self, record: &EventRecord) -> Result<(), StoreError>;

    /// Return up to `limit` events, most recently received first.
    async fn recent(&self, limit: u32) -> Result<Vec<EventRecord>, StoreError>;
}

/// [`EventLog`] stored in `PostgreSQL`.
#[derive(Clone)]
pub struct PgEventLog {
    pool: PgPool,
}

impl PgEventLog {
    /// Create an event log bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventLog for PgEventLog {
    async fn append(&self, record: &EventRecord) -> Result<(), StoreError> {
        let payload = serde_json::Value::Object(record.payload.clone());

        let result = sqlx::query(
            r"INSERT INTO events (id, source, event_type, payload, occurred_at, received_at)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id.into_inner())
        .bind(&record.source)
        .bind(&record.event_type)
        .bind(&payload)
        .bind(record.timestamp)
        .bind(record.received_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(id = %record.id, "Inserted event");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate(record.id.to_string()))
            }
            Err(e) => Err(StoreError::Postgres(e)),
        }
    }

    async fn recent(&self, limit: u32) -> Result<Vec<EventRecord>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT id, source, event_type, payload, occurred_at, received_at
              FROM events
              ORDER BY received_at DESC, id DESC
              LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EventRecord::try_from).collect()
    }
}

/// A row from the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Event id.
    pub id: Uuid,
    /// Producing service.
    pub source: String,
    /// Event type.
    pub event_type: String,
    /// JSON object payload.
    pub payload: serde_json::Value,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
    /// When the relay accepted the event.
    pub received_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let payload: EventPayload = serde_json::from_value(row.payload)?;
        Ok(Self {
            id: EventId::from(row.id),
            source: row.source,
            event_type: row.event_type,
            payload,
            timestamp: row.occurred_at,
            received_at: row.received_at,
        })
    }
}
