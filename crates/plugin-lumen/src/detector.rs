//! Mean-luminance detector.

use std::collections::BTreeMap;
use std::str::FromStr;

use zonewatch_plugin::prelude::*;

use crate::options;

/// Side of the threshold that raises an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Alarm when brighter than the threshold.
    #[default]
    Above,
    /// Alarm when darker than the threshold.
    Below,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            other => Err(format!("unknown direction '{other}', expected 'above' or 'below'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rule {
    threshold: u8,
    direction: Direction,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            threshold: 128,
            direction: Direction::Above,
        }
    }
}

impl Rule {
    fn parse(values: &BTreeMap<String, String>, base: Rule) -> Result<Self, String> {
        let threshold = match values.get(options::THRESHOLD) {
            Some(v) => v
                .trim()
                .parse::<u8>()
                .map_err(|e| format!("invalid {}: '{v}': {e}", options::THRESHOLD))?,
            None => base.threshold,
        };
        let direction = match values.get(options::DIRECTION) {
            Some(v) => v.parse()?,
            None => base.direction,
        };
        Ok(Self {
            threshold,
            direction,
        })
    }

    fn triggers(&self, luma: u32) -> bool {
        match self.direction {
            Direction::Above => luma > u32::from(self.threshold),
            Direction::Below => luma < u32::from(self.threshold),
        }
    }
}

/// Raises an alarm when a frame's mean luminance crosses the configured threshold.
#[derive(Debug, Default)]
pub struct LumenDetector {
    general: Rule,
}

impl Detector for LumenDetector {
    fn name(&self) -> &str {
        "mean-luminance"
    }

    fn configure(&mut self, general: &GeneralConfig, zones: &PluginZoneConfig) -> Result<(), String> {
        let rule = Rule::parse(&general.options, Rule::default())?;
        for (zone, config) in zones {
            Rule::parse(&config.options, rule).map_err(|e| format!("zone '{zone}': {e}"))?;
        }
        self.general = rule;
        Ok(())
    }

    fn detect(&mut self, frame: &Frame<'_>, zone: &str, config: &ZoneConfig) -> Option<Finding> {
        let rule = Rule::parse(&config.options, self.general).unwrap_or_else(|e| {
            tracing::warn!(zone = %zone, error = %e, "Ignoring invalid zone options");
            self.general
        });
        let luma = frame.mean_luma();
        rule.triggers(luma).then(|| Finding {
            score: luma,
            label: match rule.direction {
                Direction::Above => "brightened".to_string(),
                Direction::Below => "darkened".to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(options: &[(&str, &str)]) -> ZoneConfig {
        ZoneConfig {
            enabled: true,
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..ZoneConfig::default()
        }
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("Above".parse::<Direction>(), Ok(Direction::Above));
        assert_eq!(" below ".parse::<Direction>(), Ok(Direction::Below));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_configure_rejects_bad_zone_options() {
        let mut detector = LumenDetector::default();
        let mut zones = PluginZoneConfig::new();
        zones.insert("porch".to_string(), zone(&[("threshold", "300")]));

        let err = detector
            .configure(&GeneralConfig::default(), &zones)
            .unwrap_err();
        assert!(err.starts_with("zone 'porch'"));
    }

    #[test]
    fn test_detect_above_and_below() {
        let mut detector = LumenDetector::default();
        let general = GeneralConfig {
            options: BTreeMap::from([("threshold".to_string(), "100".to_string())]),
            ..GeneralConfig::default()
        };
        detector.configure(&general, &PluginZoneConfig::new()).unwrap();

        let bright = [150u8; 4];
        let frame = Frame::new(2, 2, &bright).unwrap();
        let finding = detector.detect(&frame, "hall", &zone(&[])).unwrap();
        assert_eq!(finding.score, 150);
        assert_eq!(finding.label, "brightened");

        let dark = [20u8; 4];
        let frame = Frame::new(2, 2, &dark).unwrap();
        assert!(detector.detect(&frame, "hall", &zone(&[])).is_none());
        let finding = detector
            .detect(&frame, "hall", &zone(&[("direction", "below")]))
            .unwrap();
        assert_eq!(finding.label, "darkened");
    }
}
