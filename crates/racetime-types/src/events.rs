//! Event ingestion types.
//!
//! Events are schema-less: the payload is any JSON object. Only the envelope
//! (`source`, `type`, `timestamp`) is structured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::EventId;

/// Free-form event payload. Must be a JSON object.
pub type EventPayload = serde_json::Map<String, serde_json::Value>;

/// An event as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewEvent {
    /// Producing service (e.g. `auth-service`).
    pub source: String,
    /// Event type (e.g. `user.login`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Arbitrary key/value payload.
    #[ts(type = "Record<string, unknown>")]
    pub payload: EventPayload,
    /// When the event happened. Defaults to receipt time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewEvent {
    /// Check the envelope fields that the payload type cannot express.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.source.trim().is_empty() {
            return Err(String::from("source must not be empty"));
        }
        if self.event_type.trim().is_empty() {
            return Err(String::from("type must not be empty"));
        }
        Ok(())
    }
}

/// An event as stored in the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventRecord {
    /// Unique id assigned on ingestion.
    pub id: EventId,
    /// Producing service.
    pub source: String,
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Arbitrary key/value payload.
    #[ts(type = "Record<string, unknown>")]
    pub payload: EventPayload,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// When the relay accepted the event.
    pub received_at: DateTime<Utc>,
}

impl EventRecord {
    /// Stamp a submitted event with a fresh id and receipt time.
    pub fn accept(event: NewEvent, received_at: DateTime<Utc>) -> Self {
        Self {
            id: EventId::new(),
            source: event.source,
            event_type: event.event_type,
            payload: event.payload,
            timestamp: event.timestamp.unwrap_or(received_at),
            received_at,
        }
    }
}
