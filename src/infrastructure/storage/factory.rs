//! Storage factory for runtime storage selection

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::file::FileStorage;
use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// Single JSON file on local disk
    File,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "file" | "json" => Some(Self::File),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// JSON file at the given path
    File(PathBuf),
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a file storage configuration
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Creates a PostgreSQL storage configuration
    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::File(_) => StorageType::File,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a storage instance based on the configuration
    ///
    /// `table_name` only applies to PostgreSQL.
    pub async fn create<E>(
        config: &StorageConfig,
        table_name: &str,
    ) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match config {
            StorageConfig::InMemory => Ok(Self::create_in_memory::<E>()),
            StorageConfig::File(path) => Ok(Arc::new(FileStorage::<E>::open(path).await?)),
            StorageConfig::Postgres(pg_config) => {
                Ok(Self::create_postgres::<E>(pg_config, table_name).await?)
            }
        }
    }

    /// Creates an in-memory storage
    pub fn create_in_memory<E>() -> Arc<InMemoryStorage<E>>
    where
        E: StorageEntity,
    {
        Arc::new(InMemoryStorage::new())
    }

    /// Creates a PostgreSQL storage
    pub async fn create_postgres<E>(
        config: &PostgresConfig,
        table_name: &str,
    ) -> Result<Arc<PostgresStorage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        let storage = PostgresStorage::connect(config, table_name).await?;
        storage.ensure_table().await?;
        Ok(Arc::new(storage))
    }
}
