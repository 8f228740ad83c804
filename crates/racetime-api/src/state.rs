//! Shared application state for the API server.

use std::sync::Arc;

use racetime_store::{EventLog, LiveStore};

/// State shared by all handlers.
///
/// The live store connection is shared by concurrent requests. The event
/// log is optional; without it the event endpoints answer 503.
pub struct AppState {
    /// Live snapshot store.
    pub store: Arc<dyn LiveStore>,
    /// Durable event log, if configured.
    pub events: Option<Arc<dyn EventLog>>,
}

impl AppState {
    /// State with a live store and no event log.
    pub const fn new(store: Arc<dyn LiveStore>) -> Self {
        Self {
            store,
            events: None,
        }
    }

    /// Attach an event log.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventLog>) -> Self {
        self.events = Some(events);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("events_enabled", &self.events.is_some())
            .finish_non_exhaustive()
    }
}
