//! CLI command definitions and dispatch.

pub mod auth;
pub mod config;
pub mod plugins;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use zonewatch_core::config::AppConfig;
use zonewatch_core::error::AppError;

/// Zonewatch: plugin-based zone analysis
#[derive(Debug, Parser)]
#[command(name = "zonewatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Plugin discovery and configuration
    Plugins(plugins::PluginArgs),
    /// Credential verification
    Auth(auth::AuthArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(self.config.clone())?;
        match &self.command {
            Commands::Plugins(args) => plugins::execute(args, config, self.format).await,
            Commands::Auth(args) => auth::execute(args, &config),
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }
}

/// Helper: load configuration from file and environment
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig, AppError> {
    AppConfig::load(path.as_deref())
}
