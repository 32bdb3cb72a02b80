use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::storage::{FileStorage, PostgresConfig, StorageConfig, StorageType};

/// Default PostgreSQL table for assignments
pub const DEFAULT_ASSIGNMENTS_TABLE: &str = "experiment_assignments";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where assignments are kept
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory`, `file` or `postgres`
    pub backend: String,
    /// File backend location; the platform data directory when unset
    pub path: Option<PathBuf>,
    /// PostgreSQL connection URL
    pub url: Option<String>,
    pub table: String,
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            path: None,
            url: None,
            table: DEFAULT_ASSIGNMENTS_TABLE.to_string(),
            max_connections: PostgresConfig::default().max_connections,
        }
    }
}

impl StorageSettings {
    /// Resolve into a concrete backend configuration
    pub fn to_storage_config(&self) -> Result<StorageConfig, DomainError> {
        let backend = StorageType::parse(&self.backend).ok_or_else(|| {
            DomainError::configuration(format!("Unknown storage backend: {}", self.backend))
        })?;

        match backend {
            StorageType::InMemory => Ok(StorageConfig::in_memory()),
            StorageType::File => {
                let path = match &self.path {
                    Some(path) => path.clone(),
                    None => FileStorage::<crate::domain::StoredAssignment>::default_path()
                        .ok_or_else(|| {
                            DomainError::configuration(
                                "No data directory available; set storage.path",
                            )
                        })?,
                };
                Ok(StorageConfig::file(path))
            }
            StorageType::Postgres => {
                let url = self.url.as_deref().filter(|u| !u.is_empty()).ok_or_else(|| {
                    DomainError::configuration("storage.url is required for the postgres backend")
                })?;
                Ok(StorageConfig::postgres(
                    PostgresConfig::new(url).with_max_connections(self.max_connections),
                ))
            }
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_environment(Self::environment())
    }

    /// `APP__SECTION__KEY` variables, e.g. `APP__STORAGE__PATH`
    fn environment() -> config::Environment {
        config::Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true)
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }
}
