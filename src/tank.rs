//! Tank geometry: converting a linear fill height into a volumetric
//! fill percentage.
//!
//! The sensor sits on the bottom of the tank and measures the height of
//! the liquid column above it. How that height maps to a volume fraction
//! depends on the tank shape, so each shape variant carries only the
//! dimensions its formula needs. Well-known tank types resolve by name
//! via [`TankGeometry::resolve`]; anything else must be supplied as a
//! custom calibration profile.

use crate::error::ConfigError;

/// Steel wall thickness assumed for the named tank types, in mm. The
/// sensor measures through the wall, so the wall is subtracted from both
/// the measured depth and the overall dimensions.
pub const DEFAULT_WALL_THICKNESS_MM: f64 = 3.175;

/// Shape-specific geometry, with internal (inside-wall) dimensions.
#[derive(Debug, Clone, PartialEq)]
pub enum TankShape {
    /// Cylinder lying on its side. The cylinder length cancels out of
    /// the circular-segment fraction, so only the bore matters.
    HorizontalCylinder { internal_diameter_mm: f64 },
    /// Upright cylinder or rectangular tank: volume is linear in height.
    VerticalCylinder { internal_height_mm: f64 },
    Sphere { internal_diameter_mm: f64 },
    /// Piecewise-linear calibration table of (height mm, percent) pairs,
    /// sorted by height.
    CustomProfile { points: Vec<(f64, f64)> },
}

/// A tank's geometry descriptor: its shape plus the wall thickness to
/// subtract from the measured depth.
#[derive(Debug, Clone, PartialEq)]
pub struct TankGeometry {
    pub wall_thickness_mm: f64,
    pub shape: TankShape,
}

struct NamedTank {
    id: &'static str,
    name: &'static str,
    horizontal: bool,
    overall_length_mm: f64,
    overall_diameter_mm: f64,
}

const fn vertical(
    id: &'static str,
    name: &'static str,
    overall_length_mm: f64,
    overall_diameter_mm: f64,
) -> NamedTank {
    NamedTank { id, name, horizontal: false, overall_length_mm, overall_diameter_mm }
}

const fn horizontal(
    id: &'static str,
    name: &'static str,
    overall_length_mm: f64,
    overall_diameter_mm: f64,
) -> NamedTank {
    NamedTank { id, name, horizontal: true, overall_length_mm, overall_diameter_mm }
}

const NAMED_TANKS: &[NamedTank] = &[
    vertical("20lb_v", "20lb Vertical", 316.0, 304.8),
    vertical("30lb_v", "30lb Vertical", 422.0, 304.8),
    vertical("40lb_v", "40lb Vertical", 457.0, 304.8),
    horizontal("250gal_h", "250 Gallon Horizontal", 2387.6, 762.0),
    horizontal("500gal_h", "500 Gallon Horizontal", 3022.6, 952.5),
    horizontal("1000gal_h", "1000 Gallon Horizontal", 4877.5, 1041.4),
    vertical("europe_6kg", "6kg European Vertical", 340.0, 240.0),
    vertical("europe_11kg", "11kg European Vertical", 390.0, 290.0),
    vertical("europe_14kg", "14kg European Vertical", 430.0, 290.0),
];

impl TankGeometry {
    /// Resolve a well-known tank type by id.
    ///
    /// Unknown tank types are a hard configuration error: there is no
    /// safe geometric default to fall back to.
    pub fn resolve(tank_type: &str) -> Result<TankGeometry, ConfigError> {
        let spec = NAMED_TANKS
            .iter()
            .find(|t| t.id == tank_type)
            .ok_or_else(|| ConfigError::UnsupportedTankType(tank_type.to_string()))?;
        let wall = DEFAULT_WALL_THICKNESS_MM;
        let shape = if spec.horizontal {
            TankShape::HorizontalCylinder {
                internal_diameter_mm: spec.overall_diameter_mm - 2.0 * wall,
            }
        } else {
            TankShape::VerticalCylinder {
                internal_height_mm: spec.overall_length_mm - 2.0 * wall,
            }
        };
        Ok(TankGeometry { wall_thickness_mm: wall, shape })
    }

    /// The ids of all well-known tank types.
    pub fn known_types() -> impl Iterator<Item = &'static str> {
        NAMED_TANKS.iter().map(|t| t.id)
    }

    /// The display name of a well-known tank type, if any.
    pub fn type_name(tank_type: &str) -> Option<&'static str> {
        NAMED_TANKS.iter().find(|t| t.id == tank_type).map(|t| t.name)
    }

    pub fn horizontal_cylinder(internal_diameter_mm: f64) -> TankGeometry {
        TankGeometry {
            wall_thickness_mm: 0.0,
            shape: TankShape::HorizontalCylinder { internal_diameter_mm },
        }
    }

    pub fn vertical_cylinder(internal_height_mm: f64) -> TankGeometry {
        TankGeometry {
            wall_thickness_mm: 0.0,
            shape: TankShape::VerticalCylinder { internal_height_mm },
        }
    }

    pub fn sphere(internal_diameter_mm: f64) -> TankGeometry {
        TankGeometry { wall_thickness_mm: 0.0, shape: TankShape::Sphere { internal_diameter_mm } }
    }

    /// Build a custom-profile geometry from (height mm, percent)
    /// calibration pairs. The table is sorted by height; at least two
    /// points are required to interpolate.
    pub fn custom_profile(mut points: Vec<(f64, f64)>) -> Result<TankGeometry, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::InvalidCalibrationProfile);
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(TankGeometry { wall_thickness_mm: 0.0, shape: TankShape::CustomProfile { points } })
    }

    /// Convert a measured depth (compensated distance from the sensor to
    /// the liquid surface) into a fill percentage, clamped to 0..=100.
    ///
    /// Sensor noise and mounting offset commonly push the raw
    /// computation slightly outside the physical range, hence the clamp.
    pub fn level_percent(&self, measured_depth_mm: f64) -> f64 {
        let fill_height = (measured_depth_mm - self.wall_thickness_mm).max(0.0);
        let percent = match &self.shape {
            TankShape::HorizontalCylinder { internal_diameter_mm } => {
                horizontal_cylinder_percent(fill_height, *internal_diameter_mm)
            }
            TankShape::VerticalCylinder { internal_height_mm } => {
                100.0 * fill_height / internal_height_mm
            }
            TankShape::Sphere { internal_diameter_mm } => {
                sphere_percent(fill_height, *internal_diameter_mm)
            }
            TankShape::CustomProfile { points } => interpolate_profile(points, fill_height),
        };
        percent.clamp(0.0, 100.0)
    }
}

/// Circular-segment area as a fraction of the full circle. The boundary
/// cases are handled before the arccos so its argument never leaves
/// [-1, 1].
fn horizontal_cylinder_percent(fill_height: f64, diameter: f64) -> f64 {
    if fill_height <= 0.0 {
        return 0.0;
    }
    if fill_height >= diameter {
        return 100.0;
    }
    let r = diameter / 2.0;
    let h = fill_height;
    let segment_area =
        r * r * ((r - h) / r).acos() - (r - h) * (2.0 * r * h - h * h).sqrt();
    100.0 * segment_area / (std::f64::consts::PI * r * r)
}

/// Spherical-cap volume as a fraction of the full sphere.
fn sphere_percent(fill_height: f64, diameter: f64) -> f64 {
    if fill_height <= 0.0 {
        return 0.0;
    }
    if fill_height >= diameter {
        return 100.0;
    }
    let r = diameter / 2.0;
    let h = fill_height;
    // cap volume pi*h^2*(3r - h)/3 over sphere volume 4/3*pi*r^3
    100.0 * h * h * (3.0 * r - h) / (4.0 * r * r * r)
}

/// Interpolate within the calibration table, clamping to the boundary
/// percentages outside it. Never extrapolates.
fn interpolate_profile(points: &[(f64, f64)], fill_height: f64) -> f64 {
    let (first, last) = (points[0], points[points.len() - 1]);
    if fill_height <= first.0 {
        return first.1;
    }
    if fill_height >= last.0 {
        return last.1;
    }
    for pair in points.windows(2) {
        let (h0, p0) = pair[0];
        let (h1, p1) = pair[1];
        if fill_height <= h1 {
            if h1 == h0 {
                return p1;
            }
            let t = (fill_height - h0) / (h1 - h0);
            return p0 + t * (p1 - p0);
        }
    }
    last.1
}

#[test]
fn test_horizontal_cylinder_boundaries_exact() {
    for diameter in [100.0, 300.0, 762.0, 1041.4] {
        let tank = TankGeometry::horizontal_cylinder(diameter);
        assert_eq!(tank.level_percent(0.0), 0.0);
        assert_eq!(tank.level_percent(-50.0), 0.0);
        assert_eq!(tank.level_percent(diameter), 100.0);
        assert_eq!(tank.level_percent(diameter + 1.0), 100.0);
    }
}

#[test]
fn test_horizontal_cylinder_half_full_at_radius() {
    let tank = TankGeometry::horizontal_cylinder(300.0);
    let percent = tank.level_percent(150.0);
    assert!((percent - 50.0).abs() < 1e-9, "{percent}");
}

#[test]
fn test_horizontal_cylinder_segment_fraction() {
    // h = 1.2r on a 300mm bore: segment area fraction is 62.65%
    let tank = TankGeometry::horizontal_cylinder(300.0);
    let percent = tank.level_percent(180.0);
    assert!((percent - 62.647).abs() < 0.01, "{percent}");
}

#[test]
fn test_vertical_cylinder_is_linear() {
    let tank = TankGeometry::vertical_cylinder(400.0);
    assert_eq!(tank.level_percent(0.0), 0.0);
    assert_eq!(tank.level_percent(100.0), 25.0);
    assert_eq!(tank.level_percent(400.0), 100.0);
    assert_eq!(tank.level_percent(900.0), 100.0);
}

#[test]
fn test_sphere_boundaries_and_midpoint() {
    let tank = TankGeometry::sphere(200.0);
    assert_eq!(tank.level_percent(0.0), 0.0);
    assert_eq!(tank.level_percent(200.0), 100.0);
    assert!((tank.level_percent(100.0) - 50.0).abs() < 1e-9);
    // quarter-height cap of a sphere holds 15.625% of the volume
    assert!((tank.level_percent(50.0) - 15.625).abs() < 1e-9);
}

#[test]
fn test_custom_profile_interpolates_and_clamps() {
    let tank = TankGeometry::custom_profile(vec![
        (200.0, 80.0),
        (50.0, 10.0),
        (100.0, 40.0),
    ])
    .unwrap();
    // below the table: clamp to the first point's percentage
    assert_eq!(tank.level_percent(0.0), 10.0);
    // above the table: clamp to the last point's percentage
    assert_eq!(tank.level_percent(500.0), 80.0);
    assert_eq!(tank.level_percent(75.0), 25.0);
    assert_eq!(tank.level_percent(150.0), 60.0);
}

#[test]
fn test_custom_profile_needs_two_points() {
    assert_eq!(
        TankGeometry::custom_profile(vec![(100.0, 50.0)]),
        Err(ConfigError::InvalidCalibrationProfile)
    );
}

#[test]
fn test_resolve_named_tanks() {
    let tank = TankGeometry::resolve("20lb_v").unwrap();
    assert_eq!(
        tank.shape,
        TankShape::VerticalCylinder { internal_height_mm: 316.0 - 2.0 * 3.175 }
    );
    let tank = TankGeometry::resolve("250gal_h").unwrap();
    assert_eq!(
        tank.shape,
        TankShape::HorizontalCylinder { internal_diameter_mm: 762.0 - 2.0 * 3.175 }
    );
}

#[test]
fn test_resolve_unknown_tank_is_hard_error() {
    assert_eq!(
        TankGeometry::resolve("bathtub"),
        Err(ConfigError::UnsupportedTankType("bathtub".into()))
    );
}
