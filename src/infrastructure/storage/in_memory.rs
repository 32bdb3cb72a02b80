//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Thread-safe in-memory storage implementation
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<HashMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Creates storage pre-populated with entities
    pub fn with_entities(entities: Vec<E>) -> Self {
        let map = entities
            .into_iter()
            .map(|entity| (entity.key().as_str().to_string(), entity))
            .collect();

        Self {
            entities: RwLock::new(map),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, E>>, DomainError> {
        self.entities.read().map_err(|e| {
            DomainError::store_unavailable(format!("Failed to acquire read lock: {}", e))
        })
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, E>>, DomainError> {
        self.entities.write().map_err(|e| {
            DomainError::store_unavailable(format!("Failed to acquire write lock: {}", e))
        })
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        Ok(self.read()?.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn save(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        self.write()?.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.write()?.remove(key.as_str()).is_some())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::test_support::{key, note, Note};

    #[tokio::test]
    async fn test_save_and_get() {
        let storage: InMemoryStorage<Note> = InMemoryStorage::new();
        let e = note("1", "Test");

        storage.save(e.clone()).await.unwrap();

        let result = storage.get(&key("1")).await.unwrap();
        assert_eq!(result, Some(e));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let storage: InMemoryStorage<Note> = InMemoryStorage::new();

        assert_eq!(storage.get(&key("1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let storage: InMemoryStorage<Note> = InMemoryStorage::new();
        storage.save(note("1", "Test")).await.unwrap();

        assert!(storage.delete(&key("1")).await.unwrap());
        assert!(storage.get(&key("1")).await.unwrap().is_none());
        assert!(!storage.delete(&key("1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_upserts() {
        let storage: InMemoryStorage<Note> = InMemoryStorage::new();

        storage.save(note("1", "Original")).await.unwrap();
        storage.save(note("1", "Updated")).await.unwrap();

        let result = storage.get(&key("1")).await.unwrap();
        assert_eq!(result.unwrap().body, "Updated");
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let storage = InMemoryStorage::with_entities(vec![note("1", "A"), note("2", "B")]);

        assert_eq!(storage.list().await.unwrap().len(), 2);
        assert_eq!(storage.count().await.unwrap(), 2);
    }
}
