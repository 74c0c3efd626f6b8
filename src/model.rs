//! Registry of known Mopeka sensor models.
//!
//! The first byte of the manufacturer data identifies the hardware model.
//! The set of supported models is fixed and known at build time, so the
//! registry is a static table rather than anything pluggable. Each entry
//! records the model's capabilities and which byte layout its
//! advertisements use.

/// The Bluetooth SIG company identifier under which Mopeka sensors
/// broadcast their manufacturer data.
pub const MANUFACTURER_ID: u16 = 0x0059;

/// The service UUID advertised by Mopeka sensors, usable as a scan filter.
pub const SERVICE_UUID: &str = "0000fee5-0000-1000-8000-00805f9b34fb";

/// How the fields of an advertisement are packed for a given model family.
///
/// A closed set: every supported hardware id maps to exactly one variant
/// and the decoder branches on it once per advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLayout {
    /// Pro-series layout. Distance is a 14-bit little-endian field with
    /// the 2-bit quality code packed into the top bits of the high byte.
    /// Accelerometer X/Y follow at bytes 8 and 9.
    ProSeries,
    /// Top-down (TD40/TD200) layout. Distance is a full 16-bit
    /// little-endian field and quality is a standalone byte. No
    /// accelerometer.
    TopDown,
}

/// Static descriptor of a sensor model, keyed by hardware id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorModel {
    pub hardware_id: u8,
    pub name: &'static str,
    pub layout: PayloadLayout,
    pub has_temperature: bool,
    pub has_accelerometer: bool,
    pub has_sync_button: bool,
    /// Number of quality tiers the model reports (code range is
    /// `0..max_quality_levels`).
    pub max_quality_levels: u8,
    /// Minimum manufacturer-data length required by the layout.
    pub min_payload_len: usize,
}

const fn pro(hardware_id: u8, name: &'static str) -> SensorModel {
    SensorModel {
        hardware_id,
        name,
        layout: PayloadLayout::ProSeries,
        has_temperature: true,
        has_accelerometer: true,
        has_sync_button: true,
        max_quality_levels: 4,
        min_payload_len: 10,
    }
}

const fn top_down(hardware_id: u8, name: &'static str) -> SensorModel {
    SensorModel {
        hardware_id,
        name,
        layout: PayloadLayout::TopDown,
        has_temperature: true,
        has_accelerometer: false,
        has_sync_button: true,
        max_quality_levels: 4,
        min_payload_len: 6,
    }
}

const MODELS: &[SensorModel] = &[
    pro(0x03, "Pro Plus (M1015)"),
    pro(0x04, "Pro Check (M1017)"),
    pro(0x05, "Pro 200"),
    pro(0x08, "Pro H2O"),
    pro(0x09, "Pro H2O Plus"),
    pro(0x0A, "Lippert BottleCheck"),
    top_down(0x0B, "TD40"),
    top_down(0x0C, "TD200"),
    pro(0x0D, "Pro Check Universal"),
];

/// Look up the model descriptor for a hardware id.
///
/// Returns `None` for unknown ids. An unknown id is a recoverable
/// condition: the caller decides whether to drop the advertisement.
pub fn lookup(hardware_id: u8) -> Option<&'static SensorModel> {
    MODELS.iter().find(|m| m.hardware_id == hardware_id)
}

#[test]
fn test_lookup_known_models() {
    let model = lookup(0x03).unwrap();
    assert_eq!(model.name, "Pro Plus (M1015)");
    assert_eq!(model.layout, PayloadLayout::ProSeries);
    assert!(model.has_accelerometer);

    let model = lookup(0x0B).unwrap();
    assert_eq!(model.name, "TD40");
    assert_eq!(model.layout, PayloadLayout::TopDown);
    assert!(!model.has_accelerometer);
}

#[test]
fn test_lookup_unknown_model() {
    assert!(lookup(0x00).is_none());
    assert!(lookup(0x07).is_none());
    assert!(lookup(0xFF).is_none());
}
