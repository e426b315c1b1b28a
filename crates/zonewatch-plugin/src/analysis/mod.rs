//! Image analysis side of the plugin host: detector contract, configuration
//! records, and the aggregator that owns both.

pub mod aggregator;
pub mod config;
pub mod detector;

pub use aggregator::AnalysisAggregator;
pub use config::{GeneralConfig, PluginSettings, PluginZoneConfig, SettingsFile, ZoneConfig, ZoneSettings};
pub use detector::{Detection, Detector, Finding, Frame};
