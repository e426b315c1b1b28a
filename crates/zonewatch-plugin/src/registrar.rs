//! Registration handle passed to a plugin's entry point.
//!
//! Everything a plugin installs is staged here and only committed to the
//! analysis aggregator once the entry point has returned successfully, so a
//! plugin that fails halfway leaves no trace behind.

use serde::{Deserialize, Serialize};

use crate::analysis::Detector;
use crate::error::RegistrationError;
use crate::identity::PluginIdentity;

/// One configuration option a plugin understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    /// Option key as used in the settings file.
    pub key: String,
    /// Value used when the settings file does not set one.
    pub default: String,
    /// One-line description for operators.
    pub help: String,
}

impl OptionDescriptor {
    /// Creates a new option descriptor.
    pub fn new(key: impl Into<String>, default: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
            help: help.into(),
        }
    }
}

/// Handle through which a plugin installs its detectors and option schema.
pub struct PluginRegistrar {
    identity: PluginIdentity,
    description: Option<String>,
    detectors: Vec<Box<dyn Detector>>,
    options: Vec<OptionDescriptor>,
    rejection: Option<RegistrationError>,
}

/// What a successful registration committed.
pub(crate) struct Registration {
    pub(crate) description: Option<String>,
    pub(crate) detectors: Vec<Box<dyn Detector>>,
    pub(crate) options: Vec<OptionDescriptor>,
}

impl std::fmt::Debug for PluginRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistrar")
            .field("identity", &self.identity)
            .field("detectors", &self.detectors.len())
            .field("options", &self.options)
            .field("rejection", &self.rejection)
            .finish()
    }
}

impl PluginRegistrar {
    /// Creates an empty registrar for `identity`.
    pub fn new(identity: PluginIdentity) -> Self {
        Self {
            identity,
            description: None,
            detectors: Vec::new(),
            options: Vec::new(),
            rejection: None,
        }
    }

    /// Identity the host assigned to the plugin being registered.
    pub fn identity(&self) -> &PluginIdentity {
        &self.identity
    }

    /// Sets a human-readable description of the plugin.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Installs an analysis callback.
    pub fn add_detector(&mut self, detector: Box<dyn Detector>) -> Result<(), RegistrationError> {
        if self.detectors.iter().any(|d| d.name() == detector.name()) {
            return Err(RegistrationError::Logic(format!(
                "detector '{}' registered twice",
                detector.name()
            )));
        }
        self.detectors.push(detector);
        Ok(())
    }

    /// Declares a configuration option and its default.
    pub fn declare_option(
        &mut self,
        key: impl Into<String>,
        default: impl Into<String>,
        help: impl Into<String>,
    ) -> Result<(), RegistrationError> {
        let option = OptionDescriptor::new(key, default, help);
        if self.options.iter().any(|o| o.key == option.key) {
            return Err(RegistrationError::Logic(format!(
                "option '{}' declared twice",
                option.key
            )));
        }
        self.options.push(option);
        Ok(())
    }

    /// Number of detectors installed so far.
    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Options declared so far.
    pub fn options(&self) -> &[OptionDescriptor] {
        &self.options
    }

    /// Records why registration failed; read back by the host after the
    /// entry point returns a non-zero status.
    pub fn reject(&mut self, error: RegistrationError) {
        self.rejection = Some(error);
    }

    /// Takes the recorded rejection, if any.
    pub fn take_rejection(&mut self) -> Option<RegistrationError> {
        self.rejection.take()
    }

    pub(crate) fn into_registration(self) -> Registration {
        Registration {
            description: self.description,
            detectors: self.detectors,
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Finding, Frame, ZoneConfig};

    #[derive(Debug)]
    struct Named(&'static str);

    impl Detector for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn detect(&mut self, _: &Frame<'_>, _: &str, _: &ZoneConfig) -> Option<Finding> {
            None
        }
    }

    #[test]
    fn test_duplicate_detector_is_logic_error() {
        let mut registrar = PluginRegistrar::new(PluginIdentity::new("dup"));
        registrar.add_detector(Box::new(Named("edge"))).unwrap();
        let err = registrar.add_detector(Box::new(Named("edge"))).unwrap_err();
        assert!(matches!(err, RegistrationError::Logic(_)));
        assert_eq!(registrar.detector_count(), 1);
    }

    #[test]
    fn test_duplicate_option_is_logic_error() {
        let mut registrar = PluginRegistrar::new(PluginIdentity::new("dup"));
        registrar.declare_option("threshold", "10", "").unwrap();
        assert!(registrar.declare_option("threshold", "20", "").is_err());
        assert_eq!(registrar.options()[0].default, "10");
    }
}
