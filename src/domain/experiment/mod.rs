//! Experiment domain module for persistent variant assignment
//!
//! Types and traits for binary, weighted split and multivariate experiments
//! whose outcome is chosen once and remembered.

mod assignment;
mod condition;
mod entity;
mod event;
mod repository;
mod validation;

// Re-export all public types
pub use assignment::{Assignment, StoredAssignment};
pub use condition::{
    Choices, Factor, VariableSet, Variables, Weighted, WeightedSet, DEFAULT_INCLUSION_PROBABILITY,
};
pub use entity::{ExperimentKind, ExperimentName};
pub use event::{ExperimentEvent, ExperimentObserver};
pub use repository::AssignmentStore;
pub use validation::{ExperimentValidationError, MAX_EXPERIMENT_NAME_LENGTH};

#[cfg(test)]
pub use event::mock::RecordingObserver;
#[cfg(test)]
pub use repository::MockAssignmentStore;
