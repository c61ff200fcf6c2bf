//! Configuration for fog computation and cache warming
//!
//! Options are grouped per concern and can be picked from a preset profile
//! or loaded from JSON.

use crate::core::constants::*;
use crate::core::geo::LatLngBounds;
use crate::core::resolution::{ResolutionSelector, ResolutionTuning, DEFAULT_TUNING};
use crate::{FogError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FogProfile {
    Balanced,
    /// Smaller overscan and prefetch, for memory constrained devices
    Conservative,
    /// Warms a much larger area around the viewport
    Aggressive,
    Custom(FogConfig),
}

impl FogProfile {
    pub fn resolve(&self) -> FogConfig {
        match self {
            Self::Balanced => FogConfig::default(),
            Self::Conservative => FogConfig {
                fog: FogPassConfig {
                    overscan: 1.2,
                    hex_cap: 6_000,
                    ..FogPassConfig::default()
                },
                prefetch: PrefetchConfig {
                    wide_multiplier: 2.0,
                    directional: true,
                    ..PrefetchConfig::default()
                },
                ..FogConfig::default()
            },
            Self::Aggressive => FogConfig {
                fog: FogPassConfig {
                    overscan: 2.0,
                    ..FogPassConfig::default()
                },
                prefetch: PrefetchConfig {
                    wide_multiplier: 5.0,
                    directional_span_factor: 3.0,
                    delay_ms: 30,
                    ..PrefetchConfig::default()
                },
                ..FogConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for FogProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub fog: FogPassConfig,
    pub prefetch: PrefetchConfig,
    pub throttle_ms: u64,
    pub tuning: Vec<ResolutionTuning>,
}

impl FogConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FogConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fog.overscan >= 1.0) {
            return Err(FogError::Config(format!(
                "fog overscan must be >= 1, got {}",
                self.fog.overscan
            )));
        }
        if !(self.prefetch.wide_multiplier >= 1.0) {
            return Err(FogError::Config(format!(
                "prefetch multiplier must be >= 1, got {}",
                self.prefetch.wide_multiplier
            )));
        }
        if self.tuning.is_empty() {
            return Err(FogError::Config("tuning table is empty".to_string()));
        }
        if let Some(row) = self
            .tuning
            .iter()
            .find(|row| !(row.cell_size_deg > 0.0) || !(row.padding_deg >= 0.0))
        {
            return Err(FogError::Config(format!(
                "invalid tuning row for resolution {:?}",
                row.resolution
            )));
        }
        let bounds = self.fog.outer_boundary_bounds();
        if !(bounds.south() < bounds.north() && bounds.west() < bounds.east()) {
            return Err(FogError::Config("outer boundary is empty".to_string()));
        }
        Ok(())
    }

    pub fn selector(&self) -> ResolutionSelector {
        ResolutionSelector::new(self.tuning.clone())
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            fog: FogPassConfig::default(),
            prefetch: PrefetchConfig::default(),
            throttle_ms: VIEWPORT_THROTTLE_MS,
            tuning: DEFAULT_TUNING.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogPassConfig {
    pub overscan: f64,
    pub hex_cap: usize,
    pub slow_pass_budget_ms: u64,
    /// (south, west, north, east) of the fixed fog rectangle
    pub outer_boundary: (f64, f64, f64, f64),
}

impl FogPassConfig {
    pub fn outer_boundary_bounds(&self) -> LatLngBounds {
        let (south, west, north, east) = self.outer_boundary;
        LatLngBounds::from_coords(south, west, north, east)
    }

    pub fn slow_pass_budget(&self) -> Duration {
        Duration::from_millis(self.slow_pass_budget_ms)
    }
}

impl Default for FogPassConfig {
    fn default() -> Self {
        Self {
            overscan: FOG_OVERSCAN,
            hex_cap: DEFAULT_HEX_CAP,
            slow_pass_budget_ms: SLOW_PASS_BUDGET_MS,
            outer_boundary: DEFAULT_OUTER_BOUNDARY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    pub enabled: bool,
    pub delay_ms: u64,
    pub wide_multiplier: f64,
    pub directional: bool,
    pub directional_span_factor: f64,
    pub noise_ratio: f64,
}

impl PrefetchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: PREFETCH_DELAY_MS,
            wide_multiplier: PREFETCH_WIDE_MULTIPLIER,
            directional: true,
            directional_span_factor: PREFETCH_DIRECTIONAL_SPAN_FACTOR,
            noise_ratio: PAN_NOISE_RATIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_profile_matches_defaults() {
        let config = FogProfile::Balanced.resolve();
        assert_eq!(config, FogConfig::default());
        assert_eq!(config.fog.hex_cap, DEFAULT_HEX_CAP);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profiles_differ_in_prefetch() {
        let conservative = FogProfile::Conservative.resolve();
        let aggressive = FogProfile::Aggressive.resolve();
        assert!(conservative.prefetch.wide_multiplier < aggressive.prefetch.wide_multiplier);
        assert!(conservative.validate().is_ok());
        assert!(aggressive.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FogConfig::from_json_str(r#"{ "fog": { "hex_cap": 500 } }"#).unwrap();
        assert_eq!(config.fog.hex_cap, 500);
        assert_eq!(config.fog.overscan, FOG_OVERSCAN);
        assert_eq!(config.prefetch, PrefetchConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = FogConfig::from_json_str(r#"{ "fog": { "overscan": 0.5 } }"#).unwrap_err();
        assert!(matches!(err, FogError::Config(_)));

        let err = FogConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, FogError::Serialization(_)));
    }
}
