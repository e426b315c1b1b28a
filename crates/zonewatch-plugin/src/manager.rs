//! Plugin manager façade over discovery, loading and configuration.
//!
//! The manager is the single writer of the registry and the analysis
//! aggregator. It is synchronous and takes `&mut self`; a host sharing it
//! across threads must put it behind a lock.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, error, info, warn};

use zonewatch_core::config::PluginConfig;
use zonewatch_core::result::AppResult;

use crate::analysis::{
    AnalysisAggregator, Detection, Frame, GeneralConfig, PluginZoneConfig, SettingsFile,
};
use crate::discovery::{self, Candidate};
use crate::error::{DiscoveryError, LoadError, LoadFailure, RegistrationError};
use crate::ffi::safety::panic_message;
use crate::identity::PluginIdentity;
use crate::loader::{DynamicLoader, ModuleLoader};
use crate::registrar::PluginRegistrar;
use crate::registry::{PluginRegistry, PluginState};

/// Policy the manager is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Load every discovered plugin, not only on explicit request.
    pub load_plugins: bool,
    /// File name suffix identifying plugin modules.
    pub extension: String,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            load_plugins: true,
            extension: std::env::consts::DLL_SUFFIX.to_string(),
        }
    }
}

impl From<&PluginConfig> for ManagerSettings {
    fn from(config: &PluginConfig) -> Self {
        Self {
            load_plugins: config.load_plugins,
            extension: config.extension.clone(),
        }
    }
}

/// A candidate that failed to load during a discovery pass.
#[derive(Debug)]
pub struct PluginFailure {
    /// Identity of the candidate.
    pub identity: PluginIdentity,
    /// The load error.
    pub error: LoadError,
}

/// Outcome of one discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Candidates found in the directory.
    pub discovered: usize,
    /// Candidates whose identity is registered after the pass.
    pub loaded: usize,
    /// Candidates that failed to load in this pass.
    pub failures: Vec<PluginFailure>,
    /// Set when the directory could not be read; `discovered` is then 0.
    pub scan_error: Option<DiscoveryError>,
}

/// Manages discovery, loading, registration and configuration of plugins.
pub struct PluginManager {
    settings: ManagerSettings,
    loader: Box<dyn ModuleLoader>,
    // Declared before `registry`: detectors are dropped before their modules.
    analyser: AnalysisAggregator,
    registry: PluginRegistry,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("analyser", &self.analyser)
            .finish()
    }
}

impl PluginManager {
    /// Creates a manager using `loader` to open module files.
    pub fn new(settings: ManagerSettings, loader: impl ModuleLoader + 'static) -> Self {
        Self {
            settings,
            loader: Box::new(loader),
            analyser: AnalysisAggregator::new(),
            registry: PluginRegistry::new(),
        }
    }

    /// Creates a manager loading shared libraries as configured.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(ManagerSettings::from(config), DynamicLoader::new())
    }

    /// Scans `path` and, if the load policy is on or `force_load` is set,
    /// loads every candidate not attempted before.
    ///
    /// Every candidate is recorded in the registry; those not attempted stay
    /// unregistered. Identities already loaded or failed are skipped without
    /// calling their entry point again.
    pub fn find_plugins(&mut self, path: &Path, force_load: bool) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        let candidates = match discovery::scan(path, &self.settings.extension) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(dir = %path.display(), error = %e, "Plugin directory unavailable, no plugins found");
                report.scan_error = Some(e);
                return report;
            }
        };

        let attempt = self.settings.load_plugins || force_load;
        report.discovered = candidates.len();

        for candidate in &candidates {
            self.registry
                .insert(candidate.identity.clone(), &candidate.path);

            if !attempt {
                continue;
            }

            info!(plugin = %candidate.identity, path = %candidate.path.display(), "Loading plugin");
            match self.load_candidate(candidate) {
                Ok(()) => {}
                Err(LoadError::AlreadyLoaded(identity)) => {
                    debug!(plugin = %identity, "Plugin load already attempted, skipping");
                }
                Err(e) => {
                    error!(
                        plugin = %candidate.identity,
                        path = %candidate.path.display(),
                        cause = %e.failure(),
                        error = %e,
                        "Plugin load failed"
                    );
                    report.failures.push(PluginFailure {
                        identity: candidate.identity.clone(),
                        error: e,
                    });
                }
            }

            if self.registry.is_registered(candidate.identity.as_str()) {
                report.loaded += 1;
            }
        }

        info!(
            dir = %path.display(),
            discovered = report.discovered,
            loaded = report.loaded,
            failed = report.failures.len(),
            "Plugin discovery pass complete"
        );

        report
    }

    /// Loads a single module file, registering it under the identity derived
    /// from its file name.
    pub fn load_plugin(&mut self, path: &Path) -> Result<PluginIdentity, LoadError> {
        let identity = PluginIdentity::from_path(path).ok_or_else(|| LoadError::InvalidModule {
            path: path.to_path_buf(),
            reason: "file name does not yield a plugin name".to_string(),
        })?;
        let candidate = Candidate {
            identity: identity.clone(),
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        self.registry.insert(identity.clone(), path);
        self.load_candidate(&candidate)?;
        Ok(identity)
    }

    /// Reads `config_file` and hands every registered plugin its section.
    ///
    /// Returns how many plugins accepted their configuration. On a read
    /// error the previous configuration is left untouched.
    pub fn configure_plugins(&mut self, config_file: &Path, native_detection: bool) -> AppResult<usize> {
        let settings = SettingsFile::load(config_file)?;
        Ok(self.apply_settings(&settings, native_detection))
    }

    /// Applies already-parsed settings; see [`configure_plugins`](Self::configure_plugins).
    pub fn apply_settings(&mut self, settings: &SettingsFile, native_detection: bool) -> usize {
        let configured = self.analyser.apply(settings, native_detection);
        info!(
            configured = configured,
            registered = self.registry.loaded_count(),
            native_detection = native_detection,
            "Plugins configured"
        );
        configured
    }

    /// General configuration of every identity ever discovered, in
    /// discovery order, with `registered` taken from the registry.
    pub fn general_config(&self) -> Vec<(PluginIdentity, GeneralConfig)> {
        self.registry
            .iter()
            .map(|(identity, registered)| {
                let mut general = self.analyser.general_config(identity.as_str());
                general.registered = registered;
                (identity.clone(), general)
            })
            .collect()
    }

    /// General configuration of one discovered identity.
    pub fn general_config_of(&self, identity: &str) -> Option<GeneralConfig> {
        let registered = self.registry.state(identity)? == PluginState::Registered;
        let mut general = self.analyser.general_config(identity);
        general.registered = registered;
        Some(general)
    }

    /// Zone configuration of `identity`; empty if it is not registered.
    pub fn zone_config(&self, identity: &str) -> PluginZoneConfig {
        if !self.registry.is_registered(identity) {
            debug!(plugin = %identity, "Zone config requested for unregistered plugin");
            return PluginZoneConfig::new();
        }
        self.analyser.zone_config(identity)
    }

    /// Runs the configured detectors of every registered plugin.
    pub fn analyse(&mut self, frame: &Frame<'_>, zone: &str, native_alarm: bool) -> Vec<Detection> {
        self.analyser.analyse(frame, zone, native_alarm)
    }

    /// Whether `identity` is registered.
    pub fn is_registered(&self, identity: &str) -> bool {
        self.registry.is_registered(identity)
    }

    /// Description the plugin supplied when registering.
    pub fn description(&self, identity: &str) -> Option<&str> {
        self.analyser.description(identity)
    }

    /// The manager's policy.
    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Read access to the registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Read access to the analysis aggregator.
    pub fn analyser(&self) -> &AnalysisAggregator {
        &self.analyser
    }

    fn load_candidate(&mut self, candidate: &Candidate) -> Result<(), LoadError> {
        let identity = &candidate.identity;

        if self
            .registry
            .state(identity.as_str())
            .is_some_and(|state| state.is_terminal())
        {
            return Err(LoadError::AlreadyLoaded(identity.clone()));
        }

        let mut module = match self.loader.open(&candidate.path) {
            Ok(module) => module,
            Err(e) => {
                self.registry.mark_failed(identity.as_str(), e.failure());
                return Err(e);
            }
        };

        let mut registrar = PluginRegistrar::new(identity.clone());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| module.register(&mut registrar)))
            .unwrap_or_else(|payload| {
                Err(RegistrationError::Panicked(panic_message(payload.as_ref())))
            });

        match outcome {
            Ok(()) => {
                if registrar.detector_count() == 0 {
                    warn!(plugin = %identity, "Plugin registered without detectors");
                }
                self.analyser
                    .install(identity.clone(), registrar.into_registration());
                self.registry.register(identity.as_str(), module);
                Ok(())
            }
            Err(e) => {
                let error = LoadError::from(e);
                let failure: LoadFailure = error.failure();
                self.registry.mark_failed(identity.as_str(), failure);
                Err(error)
            }
        }
    }
}
