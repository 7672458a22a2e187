//! Timeline layout constants, overridable from JSON

use serde::{Deserialize, Serialize};

use super::AtlasError;

/// Default dataset location, relative to the site root
pub const DEFAULT_DATASET_PATH: &str = "data/hikes.json";

/// Directory holding one GPX file per visit, relative to the site root
pub const DEFAULT_TRAILS_DIR: &str = "data/trails";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Horizontal density of the track
    pub pixels_per_day: f64,
    /// Total padding split evenly at both ends of the track
    pub padding_px: f64,
    /// Narrowest rendered trip capsule, regardless of its time span
    pub min_capsule_width_px: f64,
    /// Lateral distance between same-day markers inside a capsule
    pub same_day_spread_px: f64,
    /// Minimum gap between markers of an expanded capsule
    pub expanded_spacing_px: f64,
    /// Delay before a hovered capsule collapses after the pointer leaves
    pub collapse_grace_ms: f64,
    /// Background scroll speed relative to the track
    pub parallax_factor: f64,
    /// Closest a tooltip may come to either viewport edge
    pub tooltip_edge_padding_px: f64,
    /// Percent distance from either end that marks a marker as edge-anchored
    pub edge_threshold_percent: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            pixels_per_day: 4.0,
            padding_px: 200.0,
            min_capsule_width_px: 50.0,
            same_day_spread_px: 10.0,
            expanded_spacing_px: 28.0,
            collapse_grace_ms: 200.0,
            parallax_factor: 0.3,
            tooltip_edge_padding_px: 10.0,
            edge_threshold_percent: 10.0,
        }
    }
}

impl TimelineConfig {
    /// Parse overrides; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, AtlasError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AtlasError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AtlasError> {
        let positive = [
            ("pixels_per_day", self.pixels_per_day),
            ("min_capsule_width_px", self.min_capsule_width_px),
            ("expanded_spacing_px", self.expanded_spacing_px),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(AtlasError::InvalidConfig(format!("{name} must be positive")));
            }
        }

        let non_negative = [
            ("padding_px", self.padding_px),
            ("same_day_spread_px", self.same_day_spread_px),
            ("collapse_grace_ms", self.collapse_grace_ms),
            ("tooltip_edge_padding_px", self.tooltip_edge_padding_px),
            ("edge_threshold_percent", self.edge_threshold_percent),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(AtlasError::InvalidConfig(format!("{name} must not be negative")));
            }
        }

        if !(0.0..1.0).contains(&self.parallax_factor) {
            return Err(AtlasError::InvalidConfig(
                "parallax_factor must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TimelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = TimelineConfig::from_json(r#"{"pixels_per_day": 2.5}"#).unwrap();
        assert_eq!(config.pixels_per_day, 2.5);
        assert_eq!(config.min_capsule_width_px, 50.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            TimelineConfig::from_json(r#"{"pixels_per_day": 0}"#),
            Err(AtlasError::InvalidConfig(_))
        ));
        assert!(matches!(
            TimelineConfig::from_json(r#"{"parallax_factor": 1.5}"#),
            Err(AtlasError::InvalidConfig(_))
        ));
        assert!(matches!(
            TimelineConfig::from_json("not json"),
            Err(AtlasError::InvalidConfig(_))
        ));
    }
}
