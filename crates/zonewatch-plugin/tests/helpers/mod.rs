//! Shared helpers for plugin host integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use zonewatch_plugin::prelude::*;
use zonewatch_plugin::{LoadError, ManagerSettings, ModuleLoader, PluginManager, PluginModule};

/// How a scripted module behaves when opened and registered.
#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    /// Registers one brightness detector and a `threshold` option.
    Good,
    /// File opens but exports no entry point.
    MissingEntryPoint,
    /// File is not a module at all.
    Invalid,
    /// Entry point returns a runtime error.
    RuntimeError,
    /// Entry point panics.
    Panics,
    /// Installs a detector, then fails.
    PartialThenFails,
}

/// Detector raising an alarm when mean luminance exceeds `threshold`.
#[derive(Debug, Default)]
pub struct Brightness {
    threshold: u32,
}

impl Detector for Brightness {
    fn name(&self) -> &str {
        "brightness"
    }

    fn configure(&mut self, general: &GeneralConfig, _: &PluginZoneConfig) -> Result<(), String> {
        self.threshold = general
            .options
            .get("threshold")
            .map(|v| v.parse::<u32>().map_err(|e| e.to_string()))
            .transpose()?
            .unwrap_or(self.threshold);
        Ok(())
    }

    fn detect(&mut self, frame: &Frame<'_>, _: &str, config: &ZoneConfig) -> Option<Finding> {
        let threshold = config
            .options
            .get("threshold")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.threshold);
        let luma = frame.mean_luma();
        (luma > threshold).then(|| Finding {
            score: luma,
            label: "bright".to_string(),
        })
    }
}

struct Scripted {
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

impl PluginModule for Scripted {
    fn register(&mut self, registrar: &mut PluginRegistrar) -> Result<(), RegistrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Good => {
                registrar.set_description("mean luminance");
                registrar.declare_option("threshold", "128", "Alarm above this luminance")?;
                registrar.add_detector(Box::new(Brightness::default()))
            }
            Behaviour::RuntimeError => Err(RegistrationError::Runtime("camera table missing".to_string())),
            Behaviour::Panics => panic!("plugin blew up"),
            Behaviour::PartialThenFails => {
                registrar.declare_option("threshold", "1", "")?;
                registrar.add_detector(Box::new(Brightness::default()))?;
                Err(RegistrationError::Logic("second stage failed".to_string()))
            }
            Behaviour::MissingEntryPoint | Behaviour::Invalid => unreachable!("never opened"),
        }
    }
}

/// Loader serving scripted modules by file name and counting entry-point calls.
#[derive(Clone, Default)]
pub struct ScriptedLoader {
    behaviours: HashMap<String, Behaviour>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedLoader {
    pub fn with(mut self, file_name: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(file_name.to_string(), behaviour);
        self
    }

    /// Total number of entry-point invocations so far.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ModuleLoader for ScriptedLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn PluginModule>, LoadError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        match self.behaviours.get(name).copied() {
            Some(Behaviour::MissingEntryPoint) => Err(LoadError::MissingEntryPoint {
                path: path.to_path_buf(),
                symbol: "zonewatch_plugin_register".to_string(),
            }),
            None | Some(Behaviour::Invalid) => Err(LoadError::InvalidModule {
                path: path.to_path_buf(),
                reason: "not an object file".to_string(),
            }),
            Some(behaviour) => Ok(Box::new(Scripted {
                behaviour,
                calls: Arc::clone(&self.calls),
            })),
        }
    }
}

/// A temporary plugin directory populated with empty files.
pub struct PluginDir {
    dir: tempfile::TempDir,
}

impl PluginDir {
    pub fn with_files(files: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        for name in files {
            fs::write(dir.path().join(name), b"").expect("write plugin file");
        }
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a settings file next to the plugins and returns its path.
    pub fn settings(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write settings");
        path
    }
}

pub fn manager(loader: ScriptedLoader, load_plugins: bool) -> PluginManager {
    PluginManager::new(
        ManagerSettings {
            load_plugins,
            extension: ".so".to_string(),
        },
        loader,
    )
}

pub fn frame(luma: u8) -> Vec<u8> {
    vec![luma; 16]
}
