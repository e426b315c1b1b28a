//! Configuration CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use zonewatch_core::config::AppConfig;
use zonewatch_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Check that the plugin settings file parses
    Validate,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => output::print_item(config, format),
        ConfigCommand::Validate => {
            let Some(file) = config.plugins.config_file.as_deref() else {
                output::print_warning("No plugin settings file configured (plugins.config_file)");
                return Ok(());
            };
            match zonewatch_plugin::analysis::SettingsFile::load(std::path::Path::new(file)) {
                Ok(settings) => output::print_success(&format!(
                    "Plugin settings '{}' are valid ({} plugin sections)",
                    file,
                    settings.plugins.len()
                )),
                Err(e) => {
                    output::print_error(&format!("Plugin settings invalid: {}", e));
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
