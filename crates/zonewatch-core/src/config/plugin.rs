//! Plugin host configuration.

use serde::{Deserialize, Serialize};

/// Plugin discovery and loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory scanned (non-recursively) for plugin modules.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// File name suffix identifying a plugin module, including the dot.
    #[serde(default = "default_plugin_extension")]
    pub extension: String,
    /// Whether discovered plugins are loaded without an explicit request.
    #[serde(default = "default_true")]
    pub load_plugins: bool,
    /// Per-plugin settings file handed to every registered plugin.
    #[serde(default)]
    pub config_file: Option<String>,
    /// Whether the host runs its native motion detection alongside plugins.
    #[serde(default = "default_true")]
    pub native_detection: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            extension: default_plugin_extension(),
            load_plugins: true,
            config_file: None,
            native_detection: true,
        }
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}

fn default_plugin_extension() -> String {
    std::env::consts::DLL_SUFFIX.to_string()
}

fn default_true() -> bool {
    true
}
