//! Assignment store trait

use async_trait::async_trait;

use super::assignment::StoredAssignment;
use super::entity::ExperimentName;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Persistence capability consumed by the assignment engine
///
/// A `load` immediately after a `save` for the same name must return the saved
/// record. Failures surface as [`DomainError::StoreUnavailable`]; the engine never
/// retries them.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Loads the assignment recorded for an experiment, if any
    async fn load(&self, name: &ExperimentName) -> Result<Option<StoredAssignment>, DomainError>;

    /// Records an assignment, replacing any previous record for the same name
    async fn save(&self, record: StoredAssignment) -> Result<(), DomainError>;

    /// Removes the assignment for an experiment, returns true if one existed
    async fn delete(&self, name: &ExperimentName) -> Result<bool, DomainError>;
}
