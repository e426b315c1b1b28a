//! Prelude for plugin authors.

pub use crate::analysis::{Detector, Finding, Frame, GeneralConfig, PluginZoneConfig, ZoneConfig};
pub use crate::error::RegistrationError;
pub use crate::identity::PluginIdentity;
pub use crate::registrar::{OptionDescriptor, PluginRegistrar};

pub use crate::declare_plugin;
