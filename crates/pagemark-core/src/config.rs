//! Engine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Tunables for hit-testing, gesture rejection and stroke rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distance in pixels around a mark's stroke that still counts as a hit.
    pub hit_tolerance_px: f64,
    /// Smallest axis delta (page fraction) a committed mark may have.
    /// Gestures at or below it are discarded.
    pub min_mark_size: f64,
    /// Stroke width of the selected mark.
    pub selected_line_width: f64,
    /// Stroke width of every other mark and of the live preview.
    pub line_width: f64,
    /// Decimal places kept when converting pixels to fractions.
    pub fraction_decimals: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hit_tolerance_px: 2.0,
            min_mark_size: 0.01,
            selected_line_width: 5.0,
            line_width: 1.0,
            fraction_decimals: 4,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hit_tolerance_px >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "hit_tolerance_px must be non-negative, got {}",
                self.hit_tolerance_px
            )));
        }
        if !(0.0..1.0).contains(&self.min_mark_size) {
            return Err(ConfigError::Invalid(format!(
                "min_mark_size must be in [0, 1), got {}",
                self.min_mark_size
            )));
        }
        if self.line_width <= 0.0 || self.selected_line_width <= 0.0 {
            return Err(ConfigError::Invalid("line widths must be positive".to_string()));
        }
        if self.fraction_decimals > 12 {
            return Err(ConfigError::Invalid(format!(
                "fraction_decimals must be at most 12, got {}",
                self.fraction_decimals
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.hit_tolerance_px, 2.0);
        assert_eq!(config.min_mark_size, 0.01);
        assert_eq!(config.selected_line_width, 5.0);
        assert_eq!(config.line_width, 1.0);
        assert_eq!(config.fraction_decimals, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"hit_tolerance_px": 4.0}"#).unwrap();
        assert_eq!(config.hit_tolerance_px, 4.0);
        assert_eq!(config.min_mark_size, 0.01);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"min_mark_size": 2.0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"line_width": 0.0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
