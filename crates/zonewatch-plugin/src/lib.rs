//! # zonewatch-plugin
//!
//! Plugin host for Zonewatch's image-analysis pipeline. Provides:
//!
//! - Discovery of plugin modules in a flat directory, in lexicographic order
//! - Loading through the [`ModuleLoader`] seam (`libloading` behind the
//!   `dynamic` feature, or compiled-in modules via [`StaticLoader`])
//! - A registry guaranteeing each plugin identity is loaded at most once
//! - An analysis aggregator holding each plugin's detectors and its general
//!   and per-zone configuration
//! - The [`PluginManager`] façade tying these together
//!
//! Loaded modules are bound for the process lifetime and never unloaded.

pub mod analysis;
pub mod discovery;
pub mod error;
pub mod ffi;
pub mod identity;
pub mod loader;
pub mod macros;
pub mod manager;
pub mod prelude;
pub mod registrar;
pub mod registry;

pub use analysis::{Detection, Detector, Frame, GeneralConfig, PluginZoneConfig, ZoneConfig};
pub use discovery::Candidate;
pub use error::{DiscoveryError, LoadError, LoadFailure, RegistrationError};
pub use identity::PluginIdentity;
pub use loader::{DynamicLoader, ModuleLoader, PluginModule, StaticLoader};
pub use manager::{DiscoveryReport, ManagerSettings, PluginFailure, PluginManager};
pub use registrar::{OptionDescriptor, PluginRegistrar};
pub use registry::{PluginRegistry, PluginState};
