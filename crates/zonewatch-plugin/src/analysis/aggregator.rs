//! Analysis aggregator holding the detectors and configuration of every registered plugin.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, warn};

use crate::ffi::safety::panic_message;
use crate::identity::PluginIdentity;
use crate::registrar::{OptionDescriptor, Registration};

use super::config::{GeneralConfig, PluginZoneConfig, SettingsFile};
use super::detector::{Detection, Detector, Frame};

/// Detectors and configuration contributed by one plugin.
struct AnalysisSlot {
    description: Option<String>,
    detectors: Vec<Box<dyn Detector>>,
    schema: Vec<OptionDescriptor>,
    general: GeneralConfig,
    zones: PluginZoneConfig,
}

/// Holds what each registered plugin installed and the configuration
/// resolved for it.
#[derive(Default)]
pub struct AnalysisAggregator {
    slots: BTreeMap<PluginIdentity, AnalysisSlot>,
}

impl std::fmt::Debug for AnalysisAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisAggregator")
            .field("plugins", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AnalysisAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits a successful registration.
    pub(crate) fn install(&mut self, identity: PluginIdentity, registration: Registration) {
        let mut general = GeneralConfig::from_schema(&registration.options);
        general.registered = true;

        info!(
            plugin = %identity,
            detectors = registration.detectors.len(),
            options = registration.options.len(),
            "Plugin analysis installed"
        );

        self.slots.insert(
            identity,
            AnalysisSlot {
                description: registration.description,
                detectors: registration.detectors,
                schema: registration.options,
                general,
                zones: PluginZoneConfig::new(),
            },
        );
    }

    /// Whether `identity` has installed anything.
    pub fn contains(&self, identity: &str) -> bool {
        self.slots.contains_key(identity)
    }

    /// Description the plugin supplied, if any.
    pub fn description(&self, identity: &str) -> Option<&str> {
        self.slots
            .get(identity)
            .and_then(|slot| slot.description.as_deref())
    }

    /// Declared option schema of `identity`.
    pub fn schema(&self, identity: &str) -> &[OptionDescriptor] {
        self.slots
            .get(identity)
            .map(|slot| slot.schema.as_slice())
            .unwrap_or(&[])
    }

    /// General configuration of `identity`; default (empty) when unknown.
    pub fn general_config(&self, identity: &str) -> GeneralConfig {
        self.slots
            .get(identity)
            .map(|slot| slot.general.clone())
            .unwrap_or_default()
    }

    /// Zone configuration of `identity`; empty when unknown.
    pub fn zone_config(&self, identity: &str) -> PluginZoneConfig {
        self.slots
            .get(identity)
            .map(|slot| slot.zones.clone())
            .unwrap_or_default()
    }

    /// Applies a settings file to every installed plugin.
    ///
    /// Replaces previously resolved configuration. Returns the number of
    /// plugins whose detectors all accepted the new configuration.
    pub fn apply(&mut self, settings: &SettingsFile, native_detection: bool) -> usize {
        let mut configured = 0;

        for (identity, slot) in &mut self.slots {
            let section = settings
                .plugins
                .get(identity.as_str())
                .cloned()
                .unwrap_or_default();
            let (mut general, zones) = section.resolve(&slot.schema, native_detection);
            general.registered = true;

            let mut accepted = true;
            for detector in &mut slot.detectors {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    detector.configure(&general, &zones)
                }));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(reason)) => {
                        warn!(
                            plugin = %identity,
                            detector = %detector.name(),
                            reason = %reason,
                            "Detector rejected configuration"
                        );
                        accepted = false;
                    }
                    Err(payload) => {
                        error!(
                            plugin = %identity,
                            detector = %detector.name(),
                            panic = %panic_message(payload.as_ref()),
                            "Detector panicked while configuring"
                        );
                        accepted = false;
                    }
                }
            }

            general.configured = accepted;
            if accepted {
                configured += 1;
            }

            debug!(
                plugin = %identity,
                configured = accepted,
                zones = zones.len(),
                "Plugin configuration resolved"
            );

            slot.general = general;
            slot.zones = zones;
        }

        configured
    }

    /// Runs every configured, enabled detector over `frame` for `zone`.
    ///
    /// Plugins that require native detection are skipped unless
    /// `native_alarm` is set. A panicking detector is logged and skipped.
    pub fn analyse(&mut self, frame: &Frame<'_>, zone: &str, native_alarm: bool) -> Vec<Detection> {
        let mut detections = Vec::new();

        for (identity, slot) in &mut self.slots {
            if !slot.general.configured {
                continue;
            }

            let zone_config = slot
                .zones
                .get(zone)
                .cloned()
                .unwrap_or_else(|| slot.general.inherited_zone());

            if !zone_config.enabled {
                continue;
            }
            if zone_config.require_native_detection && !native_alarm {
                continue;
            }

            for detector in &mut slot.detectors {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    detector.detect(frame, zone, &zone_config)
                }));
                match outcome {
                    Ok(Some(finding)) => detections.push(Detection {
                        plugin: identity.to_string(),
                        detector: detector.name().to_string(),
                        zone: zone.to_string(),
                        score: finding.score,
                        label: finding.label,
                    }),
                    Ok(None) => {}
                    Err(payload) => error!(
                        plugin = %identity,
                        detector = %detector.name(),
                        panic = %panic_message(payload.as_ref()),
                        "Detector panicked during analysis"
                    ),
                }
            }
        }

        detections
    }
}
