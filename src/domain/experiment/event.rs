//! Lifecycle notifications emitted around assignment resolution

use serde::Serialize;

use super::assignment::Assignment;
use super::entity::{ExperimentKind, ExperimentName};

/// Advisory event describing what the engine is doing with an experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExperimentEvent {
    /// About to resolve; `cached` holds the stored assignment when one exists
    WillResolve {
        name: ExperimentName,
        kind: ExperimentKind,
        cached: Option<Assignment>,
    },
    /// Resolved; `newly_assigned` is false when the stored assignment was returned
    DidResolve {
        name: ExperimentName,
        kind: ExperimentKind,
        assignment: Assignment,
        newly_assigned: bool,
    },
    /// Stored assignment removed
    DidReset { name: ExperimentName },
}

impl ExperimentEvent {
    pub fn name(&self) -> &ExperimentName {
        match self {
            Self::WillResolve { name, .. }
            | Self::DidResolve { name, .. }
            | Self::DidReset { name } => name,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::WillResolve { .. } => "will_resolve",
            Self::DidResolve { .. } => "did_resolve",
            Self::DidReset { .. } => "did_reset",
        }
    }
}

/// Receives lifecycle events
///
/// Called synchronously from inside the engine. Implementations must not block and
/// cannot influence the outcome of the call that produced the event.
pub trait ExperimentObserver: Send + Sync {
    fn notify(&self, event: &ExperimentEvent);
}
