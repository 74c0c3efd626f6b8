use std::time::SystemTime;

/// The raw fields decoded from a single advertisement, in sensor-native
/// units. Produced once per advertisement and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReading {
    /// The hardware id byte the payload was decoded with
    pub hardware_id: u8,
    /// Raw distance to the liquid surface in sensor-native units (mm)
    pub raw_distance: u16,
    /// Raw temperature code. For all current models the code is the
    /// temperature in °C offset by +40
    pub raw_temperature: i16,
    /// Raw battery voltage code. Volts = code / 32
    pub battery_raw: u8,
    /// Read quality code, always in 0..=3
    pub quality_raw: u8,
    /// Accelerometer X axis, absent on models without an accelerometer
    pub accel_x: Option<i8>,
    /// Accelerometer Y axis, absent on models without an accelerometer
    pub accel_y: Option<i8>,
    /// Whether the sync button was held during this advertisement
    pub sync_button_pressed: Option<bool>,
}

impl RawReading {
    /// Temperature in °C.
    pub fn temperature_celsius(&self) -> i16 {
        self.raw_temperature - 40
    }

    /// Battery charge in %, derived from the coin cell voltage. 2.2 V is
    /// taken as empty and 2.85 V as full.
    pub fn battery_percent(&self) -> u8 {
        let volts = f64::from(self.battery_raw) / 32.0;
        let percent = ((volts - 2.2) / 0.65) * 100.0;
        percent.clamp(0.0, 100.0).round() as u8
    }
}

/// A fully calibrated reading derived from a [`RawReading`] plus the
/// sensor's medium and tank configuration.
///
/// Owned by the aggregator; each accepted reading supersedes the previous
/// one rather than mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedReading {
    /// Tank fill level in %, clamped to 0..=100
    pub level_percent: f64,
    /// Distance to the liquid surface after temperature compensation, in mm
    pub compensated_distance_mm: f64,
    /// Temperature in °C
    pub temperature_celsius: i16,
    /// Battery charge in %
    pub battery_percent: u8,
    /// Read quality in %, one of 0, 20, 50 or 80
    pub quality_percent: u8,
    /// Whether the reading passed the configured quality gate
    pub accepted: bool,
    /// Whether the measured temperature fell outside the compensation
    /// calibration range and was clamped
    pub temperature_out_of_range: bool,
    /// When the advertisement was received
    pub timestamp: SystemTime,
}

#[test]
fn test_temperature_celsius_offset() {
    let mut reading = RawReading {
        hardware_id: 0x03,
        raw_distance: 0,
        raw_temperature: 65,
        battery_raw: 0,
        quality_raw: 0,
        accel_x: None,
        accel_y: None,
        sync_button_pressed: None,
    };
    assert_eq!(reading.temperature_celsius(), 25);
    reading.raw_temperature = 0;
    assert_eq!(reading.temperature_celsius(), -40);
}

#[test]
fn test_battery_percent_clamped() {
    let mut reading = RawReading {
        hardware_id: 0x03,
        raw_distance: 0,
        raw_temperature: 40,
        battery_raw: 0,
        quality_raw: 0,
        accel_x: None,
        accel_y: None,
        sync_button_pressed: None,
    };
    // 0 V is far below the 2.2 V empty point
    assert_eq!(reading.battery_percent(), 0);
    // 0x60 = 96 -> 3.0 V, above the 2.85 V full point
    reading.battery_raw = 0x60;
    assert_eq!(reading.battery_percent(), 100);
    // 0x50 = 80 -> 2.5 V, mid scale
    reading.battery_raw = 0x50;
    assert_eq!(reading.battery_percent(), 46);
}
