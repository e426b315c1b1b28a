//! General and per-zone plugin configuration.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use zonewatch_core::result::AppResult;

use crate::registrar::OptionDescriptor;

/// Plugin-level configuration as exposed to operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether the plugin's module loaded and registered.
    pub registered: bool,
    /// Whether the last configuration pass was accepted by every detector.
    pub configured: bool,
    /// Whether the plugin takes part in analysis at all.
    pub enabled: bool,
    /// Run only when native detection alarmed.
    pub require_native_detection: bool,
    /// Merge native detection results with the plugin's.
    pub include_native_detection: bool,
    /// Reinitialise native detection after a plugin alarm.
    pub reinit_native_detection: bool,
    /// Plugin-specific options: declared defaults overlaid with configured values.
    pub options: BTreeMap<String, String>,
}

/// Configuration of one plugin for one monitored zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Whether the plugin analyses this zone.
    pub enabled: bool,
    /// Run only when native detection alarmed in this zone.
    pub require_native_detection: bool,
    /// Merge native detection results with the plugin's.
    pub include_native_detection: bool,
    /// Reinitialise native detection after a plugin alarm.
    pub reinit_native_detection: bool,
    /// Zone-specific options overlaid on the plugin's general options.
    pub options: BTreeMap<String, String>,
}

/// Zone name → zone configuration for one plugin.
pub type PluginZoneConfig = BTreeMap<String, ZoneConfig>;

impl GeneralConfig {
    /// Configuration of a freshly registered, not yet configured plugin.
    pub fn from_schema(schema: &[OptionDescriptor]) -> Self {
        Self {
            enabled: true,
            options: schema
                .iter()
                .map(|opt| (opt.key.clone(), opt.default.clone()))
                .collect(),
            ..Self::default()
        }
    }

    /// Zone configuration used for zones without an explicit entry.
    pub fn inherited_zone(&self) -> ZoneConfig {
        ZoneConfig {
            enabled: self.enabled,
            require_native_detection: self.require_native_detection,
            include_native_detection: self.include_native_detection,
            reinit_native_detection: self.reinit_native_detection,
            options: self.options.clone(),
        }
    }
}

/// Root of a plugin settings file: one `[plugins.<identity>]` table each.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsFile {
    /// Settings keyed by plugin identity.
    #[serde(default)]
    pub plugins: HashMap<String, PluginSettings>,
}

impl SettingsFile {
    /// Reads a settings file; the format follows the file extension.
    pub fn load(path: &Path) -> AppResult<Self> {
        let source = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(true))
            .build()?;
        let file: Self = source.try_deserialize()?;
        debug!(path = %path.display(), plugins = file.plugins.len(), "Plugin settings read");
        Ok(file)
    }
}

/// Raw settings section for one plugin.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub require_native_detection: bool,
    #[serde(default)]
    pub include_native_detection: bool,
    #[serde(default)]
    pub reinit_native_detection: bool,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub zones: BTreeMap<String, ZoneSettings>,
}

/// Raw settings for one zone; unset fields inherit the plugin-level value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneSettings {
    pub enabled: Option<bool>,
    pub require_native_detection: Option<bool>,
    pub include_native_detection: Option<bool>,
    pub reinit_native_detection: Option<bool>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            require_native_detection: false,
            include_native_detection: false,
            reinit_native_detection: false,
            options: BTreeMap::new(),
            zones: BTreeMap::new(),
        }
    }
}

impl PluginSettings {
    /// Resolves the raw section against the plugin's declared schema.
    ///
    /// Native-detection flags are forced off when native detection is not
    /// running. `registered` and `configured` are left false for the caller.
    pub fn resolve(
        &self,
        schema: &[OptionDescriptor],
        native_detection: bool,
    ) -> (GeneralConfig, PluginZoneConfig) {
        let mut general = GeneralConfig::from_schema(schema);
        general.enabled = self.enabled;
        general.require_native_detection = native_detection && self.require_native_detection;
        general.include_native_detection = native_detection && self.include_native_detection;
        general.reinit_native_detection = native_detection && self.reinit_native_detection;
        for (key, value) in &self.options {
            if !schema.iter().any(|opt| &opt.key == key) {
                debug!(option = %key, "Option not declared by plugin, keeping as-is");
            }
            general.options.insert(key.clone(), value.clone());
        }

        let zones = self
            .zones
            .iter()
            .map(|(name, zone)| {
                let mut options = general.options.clone();
                options.extend(zone.options.clone());
                let resolved = ZoneConfig {
                    enabled: zone.enabled.unwrap_or(general.enabled),
                    require_native_detection: native_detection
                        && zone
                            .require_native_detection
                            .unwrap_or(self.require_native_detection),
                    include_native_detection: native_detection
                        && zone
                            .include_native_detection
                            .unwrap_or(self.include_native_detection),
                    reinit_native_detection: native_detection
                        && zone
                            .reinit_native_detection
                            .unwrap_or(self.reinit_native_detection),
                    options,
                };
                (name.clone(), resolved)
            })
            .collect();

        (general, zones)
    }
}

fn default_true() -> bool {
    true
}
