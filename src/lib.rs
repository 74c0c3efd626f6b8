//! Decode passive BLE advertisements from Mopeka capacitive tank level sensors.
//!
//! Mopeka sensors broadcast all of their readings as manufacturer-specific
//! advertisement data, so no connection to the device is ever opened. This
//! crate turns the raw on-air bytes into calibrated values:
//!
//! - Tank fill level (%), corrected for tank shape and medium temperature response
//! - Temperature (°C)
//! - Battery level (%)
//! - Read quality (%), with a configurable acceptance threshold
//!
//! Decoding and level computation are pure functions. Per-sensor state
//! (latest accepted reading, staleness, diagnostics counters) lives in an
//! [`Aggregator`] keyed by the BLE advertising address. BLE scanning itself
//! is left to the caller; the bundled `tankread` binary shows one way to do
//! it with `bluest`.
//!
//! # Example
//!
//! ```rust
//! use std::time::SystemTime;
//!
//! let config = tankread::SensorConfig::new("propane", "250gal_h", 50).unwrap();
//! let mut aggregator = tankread::Aggregator::new();
//! aggregator.add_sensor("c3:7a:68:17:6b:fc", config);
//!
//! // A Pro Check advertisement: 25 °C, raw distance 1200, quality 3/3
//! let payload = [0x0d, 0x50, 0x41, 0xb0, 0xc4, 0x00, 0x00, 0x00, 0x05, 0xf9];
//! let outcome = aggregator
//!     .handle_advertisement("c3:7a:68:17:6b:fc", payload[0], &payload, SystemTime::now())
//!     .unwrap();
//!
//! let tankread::Outcome::Accepted(reading) = outcome else { unreachable!() };
//! assert_eq!(reading.temperature_celsius, 25);
//! assert_eq!(reading.quality_percent, 80);
//! ```

mod aggregator;
mod config;
mod decode;
mod error;
mod level;
mod medium;
mod model;
mod quality;
mod reading;
mod tank;

pub use aggregator::{Aggregator, Diagnostics, Outcome, SensorState, DEFAULT_STALE_AFTER};
pub use config::SensorConfig;
pub use decode::decode;
pub use error::{ConfigError, DecodeError};
pub use level::{
    compensate_distance, compute_level, LevelReading, MAX_TEMPERATURE_DELTA_C,
    REFERENCE_TEMPERATURE_C,
};
pub use medium::{Medium, MediumProfile};
pub use model::{
    lookup as lookup_model, PayloadLayout, SensorModel, MANUFACTURER_ID, SERVICE_UUID,
};
pub use quality::{evaluate as evaluate_quality, QUALITY_PERCENT};
pub use reading::{CalibratedReading, RawReading};
pub use tank::{TankGeometry, TankShape, DEFAULT_WALL_THICKNESS_MM};
