//! Temperature-compensation profiles for the measured medium.
//!
//! The capacitive distance reading drifts with temperature independently
//! of the actual fill level, and the drift curve depends on the medium.
//! Each profile carries the quadratic response coefficients used to
//! correct the reading.

use log::warn;

/// The substance in the tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medium {
    Propane,
    Air,
    FreshWater,
    WasteWater,
    BlackWater,
    LiveWell,
    Gasoline,
    Diesel,
    Lng,
    Oil,
    HydraulicOil,
    Custom,
}

impl Medium {
    /// All supported media, in the order they are presented to users.
    pub const ALL: &'static [Medium] = &[
        Medium::Propane,
        Medium::Air,
        Medium::FreshWater,
        Medium::WasteWater,
        Medium::BlackWater,
        Medium::LiveWell,
        Medium::Gasoline,
        Medium::Diesel,
        Medium::Lng,
        Medium::Oil,
        Medium::HydraulicOil,
        Medium::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Medium::Propane => "propane",
            Medium::Air => "air",
            Medium::FreshWater => "fresh_water",
            Medium::WasteWater => "waste_water",
            Medium::BlackWater => "black_water",
            Medium::LiveWell => "live_well",
            Medium::Gasoline => "gasoline",
            Medium::Diesel => "diesel",
            Medium::Lng => "lng",
            Medium::Oil => "oil",
            Medium::HydraulicOil => "hydraulic_oil",
            Medium::Custom => "custom",
        }
    }

    pub fn try_parse(s: &str) -> Option<Medium> {
        Medium::ALL.iter().copied().find(|m| m.as_str() == s)
    }

    /// Parse a medium name, falling back to fresh water for anything
    /// unrecognised. Sensor operation degrades gracefully rather than
    /// failing when a user supplies an unsupported medium string.
    pub fn parse(s: &str) -> Medium {
        Medium::try_parse(s).unwrap_or_else(|| {
            warn!("Unsupported medium type {s:?}, falling back to fresh water");
            Medium::FreshWater
        })
    }

    /// The compensation profile for this medium.
    pub fn profile(&self) -> &'static MediumProfile {
        match self {
            Medium::Propane | Medium::Custom => &PROPANE,
            Medium::Air => &AIR,
            Medium::FreshWater | Medium::WasteWater | Medium::BlackWater | Medium::LiveWell => {
                &WATER
            }
            Medium::Gasoline
            | Medium::Diesel
            | Medium::Lng
            | Medium::Oil
            | Medium::HydraulicOil => &HYDROCARBON,
        }
    }
}

impl std::fmt::Display for Medium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quadratic temperature-response coefficients for a medium, evaluated on
/// the sensor's raw temperature scale (°C + 40).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediumProfile {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

static PROPANE: MediumProfile = MediumProfile {
    c0: 0.573045,
    c1: -0.002822,
    c2: -0.00000535,
};

static AIR: MediumProfile = MediumProfile {
    c0: 0.153096,
    c1: 0.000327,
    c2: -0.000000294,
};

static WATER: MediumProfile = MediumProfile {
    c0: 0.600592,
    c1: 0.003124,
    c2: -0.00001368,
};

static HYDROCARBON: MediumProfile = MediumProfile {
    c0: 0.7373417462,
    c1: -0.001978229885,
    c2: 0.00000202162,
};

#[test]
fn test_parse_known_media() {
    assert_eq!(Medium::try_parse("propane"), Some(Medium::Propane));
    assert_eq!(Medium::try_parse("diesel"), Some(Medium::Diesel));
    assert_eq!(Medium::try_parse("fresh_water"), Some(Medium::FreshWater));
    for medium in Medium::ALL {
        assert_eq!(Medium::try_parse(medium.as_str()), Some(*medium));
    }
}

#[test]
fn test_unknown_medium_falls_back_to_fresh_water() {
    assert_eq!(Medium::parse("rocket_fuel"), Medium::FreshWater);
    assert_eq!(Medium::parse(""), Medium::FreshWater);
}

#[test]
fn test_water_family_shares_profile() {
    assert_eq!(Medium::WasteWater.profile(), Medium::FreshWater.profile());
    assert_eq!(Medium::BlackWater.profile(), Medium::LiveWell.profile());
}
