//! Domain layer - Core entities and contracts

pub mod error;
pub mod experiment;
pub mod storage;

pub use error::DomainError;
pub use experiment::{
    Assignment, AssignmentStore, Choices, ExperimentEvent, ExperimentKind, ExperimentName,
    ExperimentObserver, StoredAssignment, VariableSet, Variables, WeightedSet,
};
pub use storage::{Storage, StorageEntity, StorageKey};
