//! Analysis callback contract between the host and plugin detectors.

use serde::{Deserialize, Serialize};

use super::config::{GeneralConfig, PluginZoneConfig, ZoneConfig};

/// A borrowed 8-bit grayscale image handed to detectors.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wraps `pixels` as a `width` x `height` frame.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major luminance values.
    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Mean luminance, or 0 for an empty frame.
    pub fn mean_luma(&self) -> u32 {
        if self.pixels.is_empty() {
            return 0;
        }
        let sum: u64 = self.pixels.iter().map(|&p| u64::from(p)).sum();
        (sum / self.pixels.len() as u64) as u32
    }
}

/// What a detector reports for one frame and zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Detector-defined confidence or magnitude.
    pub score: u32,
    /// Short description of what was seen.
    pub label: String,
}

/// A finding attributed to the plugin and zone that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Plugin identity.
    pub plugin: String,
    /// Detector name within the plugin.
    pub detector: String,
    /// Zone the frame was analysed for.
    pub zone: String,
    /// Detector-defined confidence or magnitude.
    pub score: u32,
    /// Short description of what was seen.
    pub label: String,
}

/// Analysis callback installed by a plugin during registration.
pub trait Detector: Send {
    /// Name of this detector, unique within its plugin.
    fn name(&self) -> &str;

    /// Accepts or rejects the resolved configuration.
    ///
    /// Called on every configuration pass; later calls supersede earlier ones.
    fn configure(&mut self, general: &GeneralConfig, zones: &PluginZoneConfig) -> Result<(), String> {
        let _ = (general, zones);
        Ok(())
    }

    /// Analyses `frame` for `zone`.
    fn detect(&mut self, frame: &Frame<'_>, zone: &str, config: &ZoneConfig) -> Option<Finding>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_mismatched_buffer() {
        let pixels = [0u8; 5];
        assert!(Frame::new(2, 2, &pixels).is_none());
        assert!(Frame::new(5, 1, &pixels).is_some());
    }

    #[test]
    fn test_mean_luma() {
        let pixels = [0u8, 100, 200, 100];
        let frame = Frame::new(2, 2, &pixels).unwrap();
        assert_eq!(frame.mean_luma(), 100);
        assert_eq!(Frame::new(0, 0, &[]).unwrap().mean_luma(), 0);
    }
}
