//! In-process store implementations.
//!
//! Used by tests and by local runs without Redis or `PostgreSQL`. The live
//! store keeps the snapshot as serialized JSON so it exercises the same
//! encode/decode path as [`RedisLiveStore`](crate::RedisLiveStore).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use racetime_types::{EventRecord, Snapshot};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::event_store::EventLog;
use crate::live::LiveStore;

/// In-memory [`LiveStore`] with a switchable outage.
#[derive(Debug)]
pub struct MemoryLiveStore {
    value: RwLock<Option<String>>,
    reachable: AtomicBool,
    writes: AtomicU64,
    closes: AtomicU64,
}

impl MemoryLiveStore {
    /// Create an empty, reachable store.
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
            reachable: AtomicBool::new(true),
            writes: AtomicU64::new(0),
            closes: AtomicU64::new(0),
        }
    }

    /// Simulate the backend going down (`false`) or coming back (`true`).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Release);
    }

    /// Store raw text under the live key, bypassing serialization.
    pub async fn put_raw(&self, raw: &str) {
        *self.value.write().await = Some(raw.to_owned());
    }

    /// Number of successful `set` calls.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> u64 {
        self.closes.load(Ordering::Acquire)
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.reachable.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(String::from(
                "in-memory store marked unreachable",
            )))
        }
    }
}

impl Default for MemoryLiveStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiveStore for MemoryLiveStore {
    async fn ping(&self) -> bool {
        self.check_reachable().is_ok()
    }

    async fn set(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.check_reachable()?;
        let json = serde_json::to_string(snapshot)?;
        *self.value.write().await = Some(json);
        self.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn get(&self) -> Result<Option<Snapshot>, StoreError> {
        self.check_reachable()?;
        let value = self.value.read().await;
        value
            .as_deref()
            .map(|s| serde_json::from_str(s).map_err(StoreError::from))
            .transpose()
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::AcqRel);
    }
}

/// In-memory [`EventLog`], newest events last in storage.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: RwLock<Vec<EventRecord>>,
}

impl MemoryEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, record: &EventRecord) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        if events.iter().any(|e| e.id == record.id) {
            return Err(StoreError::Duplicate(record.id.to_string()));
        }
        events.push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<EventRecord>, StoreError> {
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let events = self.events.read().await;
        Ok(events.iter().rev().take(take).cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use racetime_types::{
        DriverPosition, EventPayload, LeaderboardEntry, NewEvent, SessionInfo,
    };

    use super::*;

    fn sample_snapshot(timestamp: &str) -> Snapshot {
        Snapshot {
            timestamp: timestamp.to_owned(),
            positions: vec![DriverPosition {
                driver_number: 44,
                driver_code: String::from("HAM"),
                x_norm: 0.1234,
                y_norm: 0.9876,
            }],
            leaderboard: vec![LeaderboardEntry {
                position: 1,
                driver_number: 44,
                driver_code: String::from("HAM"),
            }],
            session: Some(SessionInfo::default()),
        }
    }

    #[tokio::test]
    async fn get_before_any_set_is_absent() {
        let store = MemoryLiveStore::new();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get_returns_equal_snapshot() {
        let store = MemoryLiveStore::new();
        let snapshot = sample_snapshot("2024-01-01T12:00:00Z");
        store.set(&snapshot).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(snapshot));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let store = MemoryLiveStore::new();
        store.set(&sample_snapshot("a")).await.unwrap();
        store.set(&sample_snapshot("b")).await.unwrap();
        let live = store.get().await.unwrap().unwrap();
        assert_eq!(live.timestamp, "b");
    }

    #[tokio::test]
    async fn outage_surfaces_as_error_not_absent() {
        let store = MemoryLiveStore::new();
        store.set_reachable(false);
        assert!(!store.ping().await);
        assert!(store.get().await.is_err());
        assert!(store.set(&sample_snapshot("x")).await.is_err());

        store.set_reachable(true);
        assert!(store.ping().await);
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_value_is_a_serialization_error() {
        let store = MemoryLiveStore::new();
        store.put_raw("{not json").await;
        assert!(matches!(store.get().await, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn event_log_lists_newest_first() {
        let log = MemoryEventLog::new();
        for kind in ["a", "b", "c"] {
            let event = NewEvent {
                source: String::from("svc"),
                event_type: kind.to_owned(),
                payload: EventPayload::new(),
                timestamp: None,
            };
            log.append(&EventRecord::accept(event, Utc::now())).await.unwrap();
        }

        let recent = log.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event_type, "c");
        assert_eq!(recent[1].event_type, "b");
    }

    #[tokio::test]
    async fn event_log_rejects_duplicate_ids() {
        let log = MemoryEventLog::new();
        let event = NewEvent {
            source: String::from("svc"),
            event_type: String::from("dup"),
            payload: EventPayload::new(),
            timestamp: None,
        };
        let record = EventRecord::accept(event, Utc::now());
        log.append(&record).await.unwrap();
        assert!(matches!(
            log.append(&record).await,
            Err(StoreError::Duplicate(_))
        ));
    }
}
