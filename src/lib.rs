//! splitlab
//!
//! Persistent experiment assignment:
//! - Binary A/B tests and weighted multi-way splits
//! - Multivariate tests over independently included variables
//! - One durable outcome per experiment name until reset
//! - Memory, JSON file and PostgreSQL storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use infrastructure::services::AssignmentEngine;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use config::StorageSettings;
use domain::storage::Storage;
use domain::StoredAssignment;
use infrastructure::experiment::StorageAssignmentStore;
use infrastructure::storage::StorageFactory;

/// Open the configured assignment storage
pub async fn open_assignments(
    settings: &StorageSettings,
) -> anyhow::Result<Arc<dyn Storage<StoredAssignment>>> {
    let storage_config = settings.to_storage_config()?;
    info!(backend = ?storage_config.storage_type(), "Opening assignment storage");

    let storage = StorageFactory::create::<StoredAssignment>(&storage_config, &settings.table)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open assignment storage: {}", e))?;

    Ok(storage)
}

/// Engine over an already opened storage backend
pub fn create_engine(assignments: Arc<dyn Storage<StoredAssignment>>) -> AssignmentEngine {
    AssignmentEngine::new(Arc::new(StorageAssignmentStore::new(assignments)))
}

/// Create the HTTP application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let assignments = open_assignments(&config.storage).await?;
    let engine = create_engine(assignments.clone());

    Ok(AppState::new(assignments, engine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_app_state_from_file_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assignments.json");

        let mut config = AppConfig::default();
        config.storage.path = Some(path.clone());

        let state = create_app_state(&config).await.unwrap();
        let chosen = state.engine.resolve_binary("cta", 'A', 'B').await.unwrap();

        // A second state over the same file sees the recorded outcome
        let reopened = create_app_state(&config).await.unwrap();
        for _ in 0..10 {
            assert_eq!(
                reopened.engine.resolve_binary("cta", 'A', 'B').await.unwrap(),
                chosen
            );
        }
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_postgres_without_url_fails() {
        let mut config = AppConfig::default();
        config.storage.backend = "postgres".to_string();

        assert!(create_app_state(&config).await.is_err());
    }
}
