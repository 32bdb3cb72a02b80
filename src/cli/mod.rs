//! CLI module for splitlab
//!
//! Provides subcommands for:
//! - `serve`: HTTP API over the configured storage
//! - `resolve`, `show`, `list`, `reset`: one-shot assignment commands printing JSON

pub mod assign;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// splitlab - Persistent A/B, split and multivariate experiment assignment
#[derive(Parser)]
#[command(name = "splitlab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Use the file backend at this path
    #[arg(long, global = true)]
    pub storage_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn options(&self) -> CliOptions {
        CliOptions {
            storage_path: self.storage_path.clone(),
        }
    }
}

/// Flags shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub storage_path: Option<PathBuf>,
}

impl CliOptions {
    /// Load configuration, apply command-line overrides and start logging
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        dotenvy::dotenv().ok();

        let mut config = AppConfig::load()?;
        self.apply(&mut config);

        logging::init_logging(&config.logging);
        Ok(config)
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.storage_path {
            config.storage.backend = "file".to_string();
            config.storage.path = Some(path.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve,

    /// Resolve an experiment, assigning it on first use
    #[command(subcommand)]
    Resolve(assign::ResolveCommand),

    /// Print the stored assignment for an experiment
    Show { name: String },

    /// Print all stored assignments
    List,

    /// Forget the assignment for an experiment
    Reset { name: String },
}
