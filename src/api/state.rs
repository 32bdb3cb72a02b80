//! Application state for HTTP handlers

use std::sync::Arc;

use crate::domain::storage::Storage;
use crate::domain::StoredAssignment;
use crate::infrastructure::experiment::BroadcastObserver;
use crate::infrastructure::services::AssignmentEngine;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<AssignmentEngine>,
    /// Backend behind the engine's store, for listing
    pub assignments: Arc<dyn Storage<StoredAssignment>>,
    /// Lifecycle events fed by the engine
    pub events: BroadcastObserver,
}

impl AppState {
    /// Build state around `assignments`, wiring an engine that reports to `events`
    pub fn new(assignments: Arc<dyn Storage<StoredAssignment>>, engine: AssignmentEngine) -> Self {
        let events = BroadcastObserver::default();
        let engine = engine.with_observer(Arc::new(events.clone()));

        Self {
            engine: Arc::new(engine),
            assignments,
            events,
        }
    }
}
