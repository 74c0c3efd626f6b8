//! Temperature compensation and fill-level computation.
//!
//! The raw distance is first corrected for the medium's temperature
//! response, then converted to a volume fraction by the tank geometry.
//! Both steps are pure functions.

use crate::medium::MediumProfile;
use crate::tank::TankGeometry;

/// Reference temperature of the compensation curves, in °C.
pub const REFERENCE_TEMPERATURE_C: i16 = 0;

/// Largest temperature delta from the reference the compensation curves
/// are calibrated for. Inputs further out are clamped to this bound and
/// flagged rather than extrapolated.
pub const MAX_TEMPERATURE_DELTA_C: i16 = 40;

/// The result of compensating and converting one raw distance reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReading {
    /// Tank fill level in %, clamped to 0..=100
    pub level_percent: f64,
    /// Temperature-compensated distance in mm
    pub compensated_distance_mm: f64,
    /// Whether the temperature was outside the calibration range and the
    /// compensation input was clamped
    pub temperature_out_of_range: bool,
}

/// Apply the medium's temperature compensation to a raw distance.
///
/// The correction factor is the medium's quadratic response curve
/// evaluated at the reference temperature plus the (clamped) delta. The
/// curves are monotonic in the delta across the calibration window for
/// every shipped medium.
pub fn compensate_distance(
    raw_distance: u16,
    temperature_c: i16,
    profile: &MediumProfile,
) -> (f64, bool) {
    let delta = temperature_c - REFERENCE_TEMPERATURE_C;
    let clamped = delta.clamp(-MAX_TEMPERATURE_DELTA_C, MAX_TEMPERATURE_DELTA_C);
    let out_of_range = clamped != delta;
    // The curves are parameterised on the sensor's raw temperature
    // scale, which is °C + 40.
    let x = f64::from(clamped + 40);
    let factor = profile.c0 + profile.c1 * x + profile.c2 * x * x;
    (f64::from(raw_distance) * factor, out_of_range)
}

/// Compute the calibrated fill level for one raw distance reading.
pub fn compute_level(
    raw_distance: u16,
    temperature_c: i16,
    profile: &MediumProfile,
    tank: &TankGeometry,
) -> LevelReading {
    let (compensated_distance_mm, temperature_out_of_range) =
        compensate_distance(raw_distance, temperature_c, profile);
    LevelReading {
        level_percent: tank.level_percent(compensated_distance_mm),
        compensated_distance_mm,
        temperature_out_of_range,
    }
}

#[cfg(test)]
use crate::medium::Medium;

#[test]
fn test_compensation_is_monotonic_within_calibration_range() {
    for medium in Medium::ALL {
        let profile = medium.profile();
        let mut previous: Option<f64> = None;
        let mut rising = 0;
        let mut falling = 0;
        for temperature_c in -40..=40 {
            let (distance, out_of_range) = compensate_distance(1000, temperature_c, profile);
            assert!(!out_of_range);
            if let Some(previous) = previous {
                if distance > previous {
                    rising += 1;
                } else if distance < previous {
                    falling += 1;
                }
            }
            previous = Some(distance);
        }
        assert!(
            rising == 0 || falling == 0,
            "compensation not monotonic for {medium}"
        );
    }
}

#[test]
fn test_compensation_clamps_out_of_range_temperatures() {
    let profile = Medium::Propane.profile();
    let (at_bound, flagged) = compensate_distance(1000, 40, profile);
    assert!(!flagged);
    let (beyond, flagged) = compensate_distance(1000, 75, profile);
    assert!(flagged);
    assert_eq!(beyond, at_bound);
    let (below, flagged) = compensate_distance(1000, -55, profile);
    assert!(flagged);
    let (at_lower, _) = compensate_distance(1000, -40, profile);
    assert_eq!(below, at_lower);
}

#[test]
fn test_propane_compensation_reference_value() {
    // 1200 native units at 25 °C: factor 0.573045 - 0.002822*65
    // - 0.00000535*65^2 = 0.36701, giving 440.4 mm
    let (distance, _) = compensate_distance(1200, 25, Medium::Propane.profile());
    assert!((distance - 440.41).abs() < 0.01, "{distance}");
}

#[test]
fn test_level_percent_always_in_range() {
    let tanks = [
        TankGeometry::resolve("20lb_v").unwrap(),
        TankGeometry::resolve("250gal_h").unwrap(),
        TankGeometry::sphere(500.0),
    ];
    for tank in &tanks {
        for raw_distance in [0u16, 1, 150, 1200, 5000, u16::MAX] {
            for temperature_c in [-60, -10, 0, 25, 80] {
                let reading =
                    compute_level(raw_distance, temperature_c, Medium::Propane.profile(), tank);
                assert!(
                    (0.0..=100.0).contains(&reading.level_percent),
                    "{raw_distance} {temperature_c} -> {}",
                    reading.level_percent
                );
            }
        }
    }
}

#[test]
fn test_pro_check_250gal_scenario() {
    // Pro Check on a 250 gallon horizontal tank: raw distance 1200 at
    // 25 °C over propane compensates to ~440 mm, which the
    // circular-segment conversion puts at roughly 60% full.
    let tank = TankGeometry::resolve("250gal_h").unwrap();
    let reading = compute_level(1200, 25, Medium::Propane.profile(), &tank);
    assert!(
        (55.0..=65.0).contains(&reading.level_percent),
        "{}",
        reading.level_percent
    );
    assert!(!reading.temperature_out_of_range);
}
