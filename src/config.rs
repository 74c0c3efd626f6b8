//! Per-sensor configuration.
//!
//! Configuration is validated up front, before any advertisement is
//! processed. An unknown tank type is a hard error; an unknown medium
//! string degrades to the fresh-water default.

use crate::error::ConfigError;
use crate::medium::Medium;
use crate::quality;
use crate::tank::TankGeometry;

/// Validated configuration for one sensor identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    pub medium: Medium,
    pub tank: TankGeometry,
    /// Minimum quality percentage a reading must reach to be accepted.
    /// One of 0, 20, 50 or 80.
    pub min_quality_percent: u8,
}

impl SensorConfig {
    /// Build a configuration from user-supplied strings.
    ///
    /// The tank type must name a well-known tank; use
    /// [`SensorConfig::with_geometry`] for custom geometries.
    pub fn new(
        medium: &str,
        tank_type: &str,
        min_quality_percent: u8,
    ) -> Result<SensorConfig, ConfigError> {
        let tank = TankGeometry::resolve(tank_type)?;
        Self::with_geometry(Medium::parse(medium), tank, min_quality_percent)
    }

    /// Build a configuration with an explicit geometry, for tanks that
    /// are not in the well-known table.
    pub fn with_geometry(
        medium: Medium,
        tank: TankGeometry,
        min_quality_percent: u8,
    ) -> Result<SensorConfig, ConfigError> {
        if !quality::is_valid_threshold(min_quality_percent) {
            return Err(ConfigError::InvalidQualityThreshold(min_quality_percent));
        }
        Ok(SensorConfig { medium, tank, min_quality_percent })
    }
}

#[test]
fn test_config_from_strings() {
    let config = SensorConfig::new("propane", "20lb_v", 50).unwrap();
    assert_eq!(config.medium, Medium::Propane);
    assert_eq!(config.min_quality_percent, 50);
}

#[test]
fn test_unknown_tank_type_is_rejected() {
    assert_eq!(
        SensorConfig::new("propane", "oil_drum", 0),
        Err(ConfigError::UnsupportedTankType("oil_drum".into()))
    );
}

#[test]
fn test_unknown_medium_falls_back() {
    let config = SensorConfig::new("unobtainium", "20lb_v", 0).unwrap();
    assert_eq!(config.medium, Medium::FreshWater);
}

#[test]
fn test_invalid_threshold_is_rejected() {
    assert_eq!(
        SensorConfig::new("propane", "20lb_v", 42),
        Err(ConfigError::InvalidQualityThreshold(42))
    );
}
