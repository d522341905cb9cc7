//! Pipeline configuration.
//!
//! Everything a query needs beyond the graph itself lives in [`EgoConfig`],
//! which is passed explicitly through the pipeline. Values come from the
//! defaults below, an optional TOML file, and CLI overrides (in that order).

use serde::Deserialize;
use std::path::Path;

use crate::error::{EgoError, Result};
use crate::models::{PresentationMode, RadiusMethod};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_RADIUS: i64 = 2;
pub const DEFAULT_MAX_NODES: i64 = 250;

/// Penalty for being farther from the center
pub const DEFAULT_ALPHA: f64 = 0.1;

pub const DEFAULT_MIN_RADIUS: f64 = 3.0;
pub const DEFAULT_MAX_RADIUS: f64 = 10.0;
pub const DEFAULT_CENTER_RADIUS_SCALE: f64 = 1.25;

pub const DEFAULT_MIN_WIDTH: f64 = 1.5;
pub const DEFAULT_MAX_WIDTH: f64 = 4.0;
pub const DEFAULT_WIDTH_EXPONENT: f64 = 0.33;

// ============================================================================
// EgoConfig
// ============================================================================

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EgoConfig {
    /// Default hop radius when a query does not give one
    pub radius: i64,
    /// Default node budget when a query does not give one
    pub max_nodes: i64,
    pub alpha: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    /// Center radius = scale * max_radius
    pub center_radius_scale: f64,
    pub min_width: f64,
    pub max_width: f64,
    /// Compression applied to normalized edge weights before rescaling
    pub width_exponent: f64,
    pub mode: PresentationMode,
    pub radius_method: RadiusMethod,
}

impl Default for EgoConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            max_nodes: DEFAULT_MAX_NODES,
            alpha: DEFAULT_ALPHA,
            min_radius: DEFAULT_MIN_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
            center_radius_scale: DEFAULT_CENTER_RADIUS_SCALE,
            min_width: DEFAULT_MIN_WIDTH,
            max_width: DEFAULT_MAX_WIDTH,
            width_exponent: DEFAULT_WIDTH_EXPONENT,
            mode: PresentationMode::Radius,
            radius_method: RadiusMethod::ShortestPath,
        }
    }
}

impl EgoConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EgoConfig = toml::from_str(text)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check ranges. Query-level radius/max_nodes are checked again per query.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(EgoError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        check_bounds("radius", self.min_radius, self.max_radius)?;
        check_bounds("width", self.min_width, self.max_width)?;
        if !(self.width_exponent.is_finite() && self.width_exponent > 0.0) {
            return Err(EgoError::InvalidParameter(format!(
                "width_exponent must be positive, got {}",
                self.width_exponent
            )));
        }
        if !(self.center_radius_scale.is_finite() && self.center_radius_scale > 0.0) {
            return Err(EgoError::InvalidParameter(format!(
                "center_radius_scale must be positive, got {}",
                self.center_radius_scale
            )));
        }
        if self.radius < 0 {
            return Err(EgoError::InvalidParameter(format!(
                "radius must be non-negative, got {}",
                self.radius
            )));
        }
        if self.max_nodes <= 0 {
            return Err(EgoError::InvalidParameter(format!(
                "max_nodes must be positive, got {}",
                self.max_nodes
            )));
        }
        Ok(())
    }
}

fn check_bounds(what: &str, min: f64, max: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
        return Err(EgoError::InvalidParameter(format!(
            "{} bounds must satisfy 0 <= min <= max, got [{}, {}]",
            what, min, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EgoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.radius, 2);
        assert_eq!(config.max_nodes, 250);
        assert_eq!(config.mode, PresentationMode::Radius);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EgoConfig::from_toml_str("alpha = 0.2\nmode = \"path\"\n").unwrap();
        assert_eq!(config.alpha, 0.2);
        assert_eq!(config.mode, PresentationMode::Path);
        assert_eq!(config.max_radius, DEFAULT_MAX_RADIUS);
        assert_eq!(config.radius_method, RadiusMethod::ShortestPath);

        let config = EgoConfig::from_toml_str("radius_method = \"weighted_degree\"\n").unwrap();
        assert_eq!(config.radius_method, RadiusMethod::WeightedDegree);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = EgoConfig::from_toml_str("alhpa = 0.2\n");
        assert!(matches!(result, Err(EgoError::Config(_))));
    }

    #[test]
    fn test_alpha_out_of_range() {
        for alpha in [0.0, 1.0, -0.5, f64::NAN] {
            let config = EgoConfig {
                alpha,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(EgoError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = EgoConfig {
            min_radius: 12.0,
            max_radius: 10.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("radius bounds"));
    }

    #[test]
    fn test_negative_radius_and_zero_budget_rejected() {
        let config = EgoConfig {
            radius: -1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EgoConfig {
            max_nodes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
