//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from an
//! optional file (TOML, YAML or JSON, chosen by extension) overlaid with
//! `ZONEWATCH__`-prefixed environment variables.

pub mod auth;
pub mod logging;
pub mod plugin;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::auth::AuthConfig;
pub use self::logging::LoggingConfig;
pub use self::plugin::PluginConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Plugin discovery and loading settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// `config/default` is consulted if present. Environment variables such as
    /// `ZONEWATCH__PLUGINS__DIRECTORY` override file values.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let file = match path {
            Some(path) => config::File::from(path.to_path_buf()).required(true),
            None => config::File::with_name("config/default").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("ZONEWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        debug!(
            plugin_dir = %app.plugins.directory,
            load_plugins = app.plugins.load_plugins,
            "Configuration loaded"
        );

        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_without_file_sections() {
        let config = AppConfig::default();
        assert_eq!(config.plugins.directory, "./plugins");
        assert_eq!(config.plugins.extension, std::env::consts::DLL_SUFFIX);
        assert!(config.plugins.load_plugins);
        assert!(config.plugins.native_detection);
        assert_eq!(config.auth.token_issuer, "ZoneMinder");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_partial_toml_fills_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "[plugins]\ndirectory = \"/opt/zw/plugins\"\nload_plugins = false\n\n[logging]\nformat = \"json\""
        )
        .expect("write config");

        let config = AppConfig::load(Some(file.path())).expect("load config");
        assert_eq!(config.plugins.directory, "/opt/zw/plugins");
        assert!(!config.plugins.load_plugins);
        assert_eq!(config.plugins.extension, std::env::consts::DLL_SUFFIX);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.auth.token_leeway_seconds, 5);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.toml");
        let err = AppConfig::load(Some(&missing)).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
