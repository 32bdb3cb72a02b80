//! Storage-backed assignment store

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::experiment::{AssignmentStore, ExperimentName, StoredAssignment};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Adapts any `Storage<StoredAssignment>` backend to the engine's store contract
#[derive(Debug, Clone)]
pub struct StorageAssignmentStore {
    storage: Arc<dyn Storage<StoredAssignment>>,
}

impl StorageAssignmentStore {
    pub fn new(storage: Arc<dyn Storage<StoredAssignment>>) -> Self {
        Self { storage }
    }

    /// Underlying storage, for listing and administration
    pub fn storage(&self) -> &Arc<dyn Storage<StoredAssignment>> {
        &self.storage
    }
}

#[async_trait]
impl AssignmentStore for StorageAssignmentStore {
    async fn load(&self, name: &ExperimentName) -> Result<Option<StoredAssignment>, DomainError> {
        self.storage.get(name).await
    }

    async fn save(&self, record: StoredAssignment) -> Result<(), DomainError> {
        self.storage.save(record).await.map(|_| ())
    }

    async fn delete(&self, name: &ExperimentName) -> Result<bool, DomainError> {
        self.storage.delete(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::{Assignment, ExperimentKind};
    use crate::domain::storage::mock::MockStorage;
    use crate::infrastructure::storage::InMemoryStorage;
    use serde_json::json;

    fn name(s: &str) -> ExperimentName {
        ExperimentName::new(s).unwrap()
    }

    fn record(s: &str, value: &str) -> StoredAssignment {
        StoredAssignment::new(
            name(s),
            ExperimentKind::WeightedSplit,
            Assignment::Condition(json!(value)),
        )
    }

    #[tokio::test]
    async fn test_load_after_save() {
        let store = StorageAssignmentStore::new(Arc::new(InMemoryStorage::<StoredAssignment>::new()));

        store.save(record("layout", "grid")).await.unwrap();

        let loaded = store.load(&name("layout")).await.unwrap().unwrap();
        assert_eq!(loaded.assignment(), &Assignment::Condition(json!("grid")));
    }

    #[tokio::test]
    async fn test_save_replaces_existing() {
        let store = StorageAssignmentStore::new(Arc::new(InMemoryStorage::<StoredAssignment>::new()));

        store.save(record("layout", "grid")).await.unwrap();
        store.save(record("layout", "list")).await.unwrap();

        let loaded = store.load(&name("layout")).await.unwrap().unwrap();
        assert_eq!(loaded.assignment(), &Assignment::Condition(json!("list")));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = StorageAssignmentStore::new(Arc::new(InMemoryStorage::<StoredAssignment>::new()));

        store.save(record("layout", "grid")).await.unwrap();

        assert!(store.delete(&name("layout")).await.unwrap());
        assert!(store.load(&name("layout")).await.unwrap().is_none());
        assert!(!store.delete(&name("layout")).await.unwrap());
    }

    #[tokio::test]
    async fn test_backend_failure_is_store_unavailable() {
        let storage: MockStorage<StoredAssignment> = MockStorage::new().with_error("offline");
        let store = StorageAssignmentStore::new(Arc::new(storage));

        let load = store.load(&name("layout")).await;
        let save = store.save(record("layout", "grid")).await;
        let delete = store.delete(&name("layout")).await;

        assert!(load.unwrap_err().is_store_unavailable());
        assert!(save.unwrap_err().is_store_unavailable());
        assert!(delete.unwrap_err().is_store_unavailable());
    }
}
