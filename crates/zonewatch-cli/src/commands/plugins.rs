//! Plugin CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use zonewatch_core::config::AppConfig;
use zonewatch_core::error::AppError;
use zonewatch_plugin::{DiscoveryReport, PluginManager};

/// Arguments for plugin commands
#[derive(Debug, Args)]
pub struct PluginArgs {
    /// Plugin directory (overrides plugins.directory)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Load discovered plugins even if plugins.load_plugins is off
    #[arg(long, global = true)]
    pub force: bool,

    /// Plugin subcommand
    #[command(subcommand)]
    pub command: PluginCommand,
}

/// Plugin subcommands
#[derive(Debug, Subcommand)]
pub enum PluginCommand {
    /// List discovered plugins with their general configuration
    List,
    /// Show one plugin's per-zone configuration
    Zones {
        /// Plugin name (file name without extension)
        name: String,
    },
}

/// One row of `plugins list`.
#[derive(Debug, Serialize, Tabled)]
pub struct PluginRow {
    #[tabled(rename = "Plugin")]
    pub name: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Enabled")]
    pub enabled: bool,
    #[tabled(rename = "Configured")]
    pub configured: bool,
    #[tabled(rename = "Require native")]
    pub require_native_detection: bool,
    #[tabled(rename = "Include native")]
    pub include_native_detection: bool,
    #[tabled(rename = "Options")]
    pub options: String,
}

/// One row of `plugins zones`.
#[derive(Debug, Serialize, Tabled)]
pub struct ZoneRow {
    #[tabled(rename = "Zone")]
    pub zone: String,
    #[tabled(rename = "Enabled")]
    pub enabled: bool,
    #[tabled(rename = "Require native")]
    pub require_native_detection: bool,
    #[tabled(rename = "Include native")]
    pub include_native_detection: bool,
    #[tabled(rename = "Reinit native")]
    pub reinit_native_detection: bool,
    #[tabled(rename = "Options")]
    pub options: String,
}

/// Execute plugin commands
pub async fn execute(args: &PluginArgs, config: AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.plugins.directory));
    let force = args.force;

    let (manager, report) = tokio::task::spawn_blocking(move || discover(&config, &dir, force))
        .await
        .map_err(|e| AppError::internal(format!("Plugin discovery task failed: {}", e)))??;

    if let Some(e) = &report.scan_error {
        output::print_warning(&e.to_string());
    }

    match &args.command {
        PluginCommand::List => {
            let rows = plugin_rows(&manager);
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                println!(
                    "{} discovered, {} loaded, {} failed",
                    report.discovered,
                    report.loaded,
                    report.failures.len()
                );
            }
        }
        PluginCommand::Zones { name } => {
            if manager.registry().state(name).is_none() {
                return Err(AppError::not_found(format!("Plugin '{}' not found", name)));
            }
            if !manager.is_registered(name) {
                output::print_warning(&format!("Plugin '{}' is not registered", name));
            }
            let rows = zone_rows(&manager, name);
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

/// Runs one discovery pass and, if configured, applies the plugin settings file.
fn discover(config: &AppConfig, dir: &Path, force: bool) -> Result<(PluginManager, DiscoveryReport), AppError> {
    let mut manager = PluginManager::from_config(&config.plugins);
    let report = manager.find_plugins(dir, force);

    if let Some(file) = config.plugins.config_file.as_deref() {
        manager.configure_plugins(Path::new(file), config.plugins.native_detection)?;
    }

    Ok((manager, report))
}

fn plugin_rows(manager: &PluginManager) -> Vec<PluginRow> {
    manager
        .registry()
        .states()
        .zip(manager.general_config())
        .map(|((identity, state), (_, config))| PluginRow {
            name: identity.to_string(),
            state: state.to_string(),
            enabled: config.enabled,
            configured: config.configured,
            require_native_detection: config.require_native_detection,
            include_native_detection: config.include_native_detection,
            options: output::format_options(&config.options),
        })
        .collect()
}

fn zone_rows(manager: &PluginManager, name: &str) -> Vec<ZoneRow> {
    manager
        .zone_config(name)
        .into_iter()
        .map(|(zone, config)| ZoneRow {
            zone,
            enabled: config.enabled,
            require_native_detection: config.require_native_detection,
            include_native_detection: config.include_native_detection,
            reinit_native_detection: config.reinit_native_detection,
            options: output::format_options(&config.options),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_missing_directory_is_not_fatal() {
        let config = AppConfig::default();
        let (manager, report) = discover(&config, Path::new("/no/such/plugins"), true).unwrap();
        assert_eq!(report.discovered, 0);
        assert!(report.scan_error.is_some());
        assert!(plugin_rows(&manager).is_empty());
        assert!(zone_rows(&manager, "anything").is_empty());
    }
}
