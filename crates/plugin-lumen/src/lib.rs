//! # Plugin Lumen
//!
//! A Zonewatch analysis plugin raising an alarm when a zone's mean luminance
//! crosses a threshold, e.g. lights switched on in a dark room.
//!
//! Built as a `cdylib`, it exports the standard registration entry point and
//! can be dropped into the host's plugin directory.

pub mod detector;

use zonewatch_plugin::prelude::*;

pub use detector::{Direction, LumenDetector};

/// Option keys understood by this plugin.
pub mod options {
    /// Luminance level (0-255) that raises an alarm.
    pub const THRESHOLD: &str = "threshold";
    /// `above` or `below`: which side of the threshold alarms.
    pub const DIRECTION: &str = "direction";
}

/// Registers the luminance detector and its options.
pub fn register(registrar: &mut PluginRegistrar) -> Result<(), RegistrationError> {
    registrar.set_description("Alarms when mean zone luminance crosses a threshold");
    registrar.declare_option(options::THRESHOLD, "128", "Luminance level (0-255) that raises an alarm")?;
    registrar.declare_option(options::DIRECTION, "above", "Alarm when luminance is `above` or `below` the threshold")?;
    registrar.add_detector(Box::new(LumenDetector::default()))?;
    tracing::debug!(plugin = %registrar.identity(), "Lumen detector registered");
    Ok(())
}

declare_plugin!(register);
