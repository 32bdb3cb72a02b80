//! JSON file storage implementation
//!
//! Keeps the whole collection in memory and rewrites a single JSON document on
//! every mutation. Suited to per-installation state such as experiment assignments.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Default file name inside the application data directory
const DEFAULT_FILE_NAME: &str = "assignments.json";

/// Application directory under the platform data dir
const APP_DIR: &str = "splitlab";

/// File-backed storage that persists every write before acknowledging it
#[derive(Debug)]
pub struct FileStorage<E>
where
    E: StorageEntity,
{
    path: PathBuf,
    entities: RwLock<BTreeMap<String, E>>,
}

impl<E> FileStorage<E>
where
    E: StorageEntity,
{
    /// Default location, `<data_dir>/splitlab/assignments.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR).join(DEFAULT_FILE_NAME))
    }

    /// Opens the file at `path`, starting empty when it does not exist yet
    ///
    /// A file that exists but cannot be parsed is an error rather than an empty
    /// store, so a corrupt file never silently drops recorded state.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();

        let entities = if fs::try_exists(&path).await.map_err(|e| {
            DomainError::store_unavailable(format!("Failed to stat {}: {}", path.display(), e))
        })? {
            let content = fs::read_to_string(&path).await.map_err(|e| {
                DomainError::store_unavailable(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Self::parse(&path, &content)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entities: RwLock::new(entities),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(path: &Path, content: &str) -> Result<BTreeMap<String, E>, DomainError> {
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let list: Vec<E> = serde_json::from_str(content).map_err(|e| {
            DomainError::store_unavailable(format!(
                "Failed to parse {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(list
            .into_iter()
            .map(|entity| (entity.key().as_str().to_string(), entity))
            .collect())
    }

    /// Writes the collection to a sibling temp file and renames it over the target
    async fn persist(&self, entities: &BTreeMap<String, E>) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    DomainError::store_unavailable(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let list: Vec<&E> = entities.values().collect();
        let content = serde_json::to_string_pretty(&list)?;

        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, content).await.map_err(|e| {
            DomainError::store_unavailable(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;

        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            DomainError::store_unavailable(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Applies `change` to a copy, persists it, then swaps it in
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, E>) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut guard = self.entities.write().await;
        let mut next = guard.clone();
        let result = change(&mut next)?;

        self.persist(&next).await?;
        *guard = next;

        Ok(result)
    }
}

#[async_trait]
impl<E> Storage<E> for FileStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        Ok(self.entities.read().await.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        Ok(self.entities.read().await.values().cloned().collect())
    }

    async fn save(&self, entity: E) -> Result<E, DomainError> {
        self.mutate(|entities| {
            entities.insert(entity.key().as_str().to_string(), entity.clone());
            Ok(entity)
        })
        .await
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        if !self.entities.read().await.contains_key(key.as_str()) {
            return Ok(false);
        }

        self.mutate(|entities| Ok(entities.remove(key.as_str()).is_some()))
            .await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.entities.read().await.len())
    }
}
