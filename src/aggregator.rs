//! Per-sensor aggregation of decoded advertisements.
//!
//! The aggregator is a registry keyed by sensor identity (the BLE
//! advertising address). Each identity carries its own configuration,
//! its latest accepted reading and its diagnostics counters; identities
//! are fully independent. Updates go through `&mut self`, so the caller
//! supplies the single-writer discipline — the bundled scanner binary
//! drives one aggregator from one task.
//!
//! Each sensor moves through three states:
//!
//! - `Unseen`: configured but no accepted reading yet
//! - `Active`: an accepted reading arrived within the staleness window
//! - `Stale`: no accepted reading within the window; the last known
//!   good reading is retained for display, only the health flag flips
//!
//! Rejected readings and decode failures never transition state; they
//! are recorded as diagnostics counters and the last failing payload.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime};

use log::{debug, warn};

use crate::config::SensorConfig;
use crate::decode;
use crate::error::DecodeError;
use crate::level;
use crate::quality;
use crate::reading::CalibratedReading;

/// How long after the last accepted reading a sensor is considered
/// stale, unless overridden with [`Aggregator::with_stale_after`].
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(120);

/// Availability state of one sensor identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Unseen,
    Active,
    Stale,
}

/// The outcome of handling one advertisement that decoded successfully.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The reading passed the quality gate and replaced the stored one.
    Accepted(CalibratedReading),
    /// The reading failed the quality gate; the stored reading is
    /// unchanged.
    Rejected { quality_percent: u8 },
    /// No configuration exists for this identity; the advertisement was
    /// dropped without decoding.
    NotConfigured,
}

/// Diagnostics counters for one sensor identity, kept outside the
/// reading state so failures never disturb it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub decode_failures: u64,
    pub quality_rejections: u64,
    /// Hex dump of the most recent payload that failed to decode.
    pub last_failed_payload: Option<String>,
}

struct SensorRecord {
    config: SensorConfig,
    last_good: Option<CalibratedReading>,
    last_accepted_at: Option<Instant>,
    diagnostics: Diagnostics,
}

/// Registry of sensor state keyed by identity.
pub struct Aggregator {
    stale_after: Duration,
    sensors: HashMap<String, SensorRecord>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::with_stale_after(DEFAULT_STALE_AFTER)
    }

    pub fn with_stale_after(stale_after: Duration) -> Self {
        Self { stale_after, sensors: HashMap::new() }
    }

    /// Register a sensor identity. Replaces the configuration if the
    /// identity already exists, keeping its reading state.
    pub fn add_sensor(&mut self, identity: &str, config: SensorConfig) {
        match self.sensors.get_mut(identity) {
            Some(record) => record.config = config,
            None => {
                self.sensors.insert(
                    identity.to_string(),
                    SensorRecord {
                        config,
                        last_good: None,
                        last_accepted_at: None,
                        diagnostics: Diagnostics::default(),
                    },
                );
            }
        }
    }

    /// Remove a sensor identity and all its state.
    pub fn remove_sensor(&mut self, identity: &str) -> bool {
        self.sensors.remove(identity).is_some()
    }

    pub fn is_configured(&self, identity: &str) -> bool {
        self.sensors.contains_key(identity)
    }

    /// Handle one observed advertisement.
    ///
    /// A decode failure is a terminal outcome for this single
    /// advertisement; the next one is an independent event.
    pub fn handle_advertisement(
        &mut self,
        identity: &str,
        hardware_id: u8,
        payload: &[u8],
        timestamp: SystemTime,
    ) -> Result<Outcome, DecodeError> {
        let Some(record) = self.sensors.get_mut(identity) else {
            debug!("Dropping advertisement from unconfigured sensor {identity}");
            return Ok(Outcome::NotConfigured);
        };

        let raw = match decode::decode(hardware_id, payload) {
            Ok(raw) => raw,
            Err(err) => {
                record.diagnostics.decode_failures += 1;
                record.diagnostics.last_failed_payload = Some(hex::encode(payload));
                warn!("Failed to decode advertisement from {identity}: {err}");
                return Err(err);
            }
        };

        let (quality_percent, accepted) =
            quality::evaluate(raw.quality_raw, record.config.min_quality_percent);
        if !accepted {
            record.diagnostics.quality_rejections += 1;
            debug!(
                "Rejected reading from {identity}: quality {quality_percent}% below {}%",
                record.config.min_quality_percent
            );
            return Ok(Outcome::Rejected { quality_percent });
        }

        let temperature_celsius = raw.temperature_celsius();
        let level = level::compute_level(
            raw.raw_distance,
            temperature_celsius,
            record.config.medium.profile(),
            &record.config.tank,
        );
        if level.temperature_out_of_range {
            warn!(
                "Temperature {temperature_celsius} °C from {identity} is outside the \
                 compensation calibration range, clamping"
            );
        }

        let reading = CalibratedReading {
            level_percent: level.level_percent,
            compensated_distance_mm: level.compensated_distance_mm,
            temperature_celsius,
            battery_percent: raw.battery_percent(),
            quality_percent,
            accepted: true,
            temperature_out_of_range: level.temperature_out_of_range,
            timestamp,
        };
        record.last_good = Some(reading.clone());
        record.last_accepted_at = Some(Instant::now());
        Ok(Outcome::Accepted(reading))
    }

    /// The latest accepted reading for an identity, `None` while the
    /// sensor is unseen. Stale sensors keep reporting their last known
    /// good reading.
    pub fn reading(&self, identity: &str) -> Option<&CalibratedReading> {
        self.sensors.get(identity)?.last_good.as_ref()
    }

    pub fn diagnostics(&self, identity: &str) -> Option<&Diagnostics> {
        self.sensors.get(identity).map(|r| &r.diagnostics)
    }

    /// Time since the last accepted reading, `None` while unseen.
    pub fn last_accepted_age(&self, identity: &str) -> Option<Duration> {
        let at = self.sensors.get(identity)?.last_accepted_at?;
        Some(at.elapsed())
    }

    pub fn state(&self, identity: &str) -> SensorState {
        self.state_at(identity, Instant::now())
    }

    /// Availability state evaluated against an explicit instant.
    /// Staleness is derived lazily from the last accepted reading rather
    /// than kept by a timer.
    pub fn state_at(&self, identity: &str, now: Instant) -> SensorState {
        let Some(record) = self.sensors.get(identity) else {
            return SensorState::Unseen;
        };
        match record.last_accepted_at {
            None => SensorState::Unseen,
            Some(at) if now.saturating_duration_since(at) < self.stale_after => {
                SensorState::Active
            }
            Some(_) => SensorState::Stale,
        }
    }
}

#[cfg(test)]
use crate::decode::{encode_pro, encode_top_down};

#[cfg(test)]
const ADDRESS: &str = "c3:7a:68:17:6b:fc";

#[cfg(test)]
fn propane_250gal(min_quality_percent: u8) -> SensorConfig {
    SensorConfig::new("propane", "250gal_h", min_quality_percent).unwrap()
}

#[test]
fn test_accepted_reading_becomes_active() {
    let mut aggregator = Aggregator::new();
    aggregator.add_sensor(ADDRESS, propane_250gal(50));
    assert_eq!(aggregator.state(ADDRESS), SensorState::Unseen);
    assert_eq!(aggregator.reading(ADDRESS), None);

    let payload = encode_pro(0x0D, 0x50, 65, false, 1200, 3, 0, 0);
    let outcome = aggregator
        .handle_advertisement(ADDRESS, 0x0D, &payload, SystemTime::now())
        .unwrap();

    let Outcome::Accepted(reading) = outcome else {
        panic!("expected accepted outcome, got {outcome:?}");
    };
    assert!(reading.accepted);
    assert_eq!(reading.quality_percent, 80);
    assert_eq!(reading.temperature_celsius, 25);
    assert!((55.0..=65.0).contains(&reading.level_percent), "{}", reading.level_percent);
    assert_eq!(aggregator.state(ADDRESS), SensorState::Active);
    assert_eq!(aggregator.reading(ADDRESS), Some(&reading));
}

#[test]
fn test_rejected_reading_keeps_last_known_good() {
    let mut aggregator = Aggregator::new();
    aggregator.add_sensor(ADDRESS, propane_250gal(80));

    let good = encode_pro(0x0D, 0x50, 65, false, 1200, 3, 0, 0);
    aggregator.handle_advertisement(ADDRESS, 0x0D, &good, SystemTime::now()).unwrap();
    let stored = aggregator.reading(ADDRESS).unwrap().clone();

    // quality 2 maps to 50%, below the 80% threshold
    let poor = encode_pro(0x0D, 0x50, 65, false, 300, 2, 0, 0);
    let outcome =
        aggregator.handle_advertisement(ADDRESS, 0x0D, &poor, SystemTime::now()).unwrap();
    assert_eq!(outcome, Outcome::Rejected { quality_percent: 50 });
    assert_eq!(aggregator.reading(ADDRESS), Some(&stored));
    assert_eq!(aggregator.diagnostics(ADDRESS).unwrap().quality_rejections, 1);
}

#[test]
fn test_rejection_does_not_transition_state() {
    let mut aggregator = Aggregator::new();
    aggregator.add_sensor(ADDRESS, propane_250gal(80));

    let poor = encode_pro(0x0D, 0x50, 65, false, 300, 1, 0, 0);
    aggregator.handle_advertisement(ADDRESS, 0x0D, &poor, SystemTime::now()).unwrap();
    assert_eq!(aggregator.state(ADDRESS), SensorState::Unseen);
}

#[test]
fn test_decode_failure_is_counted_with_payload() {
    let mut aggregator = Aggregator::new();
    aggregator.add_sensor(ADDRESS, propane_250gal(0));

    let truncated = [0x0Du8, 0x50, 0x41];
    let err = aggregator
        .handle_advertisement(ADDRESS, 0x0D, &truncated, SystemTime::now())
        .unwrap_err();
    assert_eq!(err, DecodeError::TruncatedPayload { expected: 10, actual: 3 });

    let diagnostics = aggregator.diagnostics(ADDRESS).unwrap();
    assert_eq!(diagnostics.decode_failures, 1);
    assert_eq!(diagnostics.last_failed_payload.as_deref(), Some("0d5041"));
    assert_eq!(aggregator.state(ADDRESS), SensorState::Unseen);
}

#[test]
fn test_active_goes_stale_after_timeout_keeping_reading() {
    let mut aggregator = Aggregator::new();
    aggregator.add_sensor(ADDRESS, propane_250gal(0));

    let payload = encode_top_down(0x0B, 0x50, 65, 900, 3);
    aggregator.handle_advertisement(ADDRESS, 0x0B, &payload, SystemTime::now()).unwrap();
    let stored = aggregator.reading(ADDRESS).unwrap().clone();

    let now = Instant::now();
    assert_eq!(aggregator.state_at(ADDRESS, now), SensorState::Active);
    let later = now + DEFAULT_STALE_AFTER + Duration::from_secs(1);
    assert_eq!(aggregator.state_at(ADDRESS, later), SensorState::Stale);
    // stale only flips the health flag, the values are untouched
    assert_eq!(aggregator.reading(ADDRESS), Some(&stored));
}

#[test]
fn test_new_accepted_reading_resets_staleness() {
    let mut aggregator = Aggregator::with_stale_after(Duration::from_secs(3600));
    aggregator.add_sensor(ADDRESS, propane_250gal(0));

    let first = encode_pro(0x0D, 0x50, 65, false, 1200, 2, 0, 0);
    aggregator.handle_advertisement(ADDRESS, 0x0D, &first, SystemTime::now()).unwrap();
    let second = encode_pro(0x0D, 0x50, 65, false, 1100, 3, 0, 0);
    let outcome =
        aggregator.handle_advertisement(ADDRESS, 0x0D, &second, SystemTime::now()).unwrap();

    let Outcome::Accepted(reading) = outcome else {
        panic!("expected accepted outcome, got {outcome:?}");
    };
    assert_eq!(aggregator.reading(ADDRESS), Some(&reading));
    assert_eq!(aggregator.state(ADDRESS), SensorState::Active);
}

#[test]
fn test_identities_are_independent() {
    let mut aggregator = Aggregator::new();
    aggregator.add_sensor("aa:aa:aa:aa:aa:aa", propane_250gal(0));
    aggregator.add_sensor("bb:bb:bb:bb:bb:bb", propane_250gal(0));

    let payload = encode_pro(0x03, 0x50, 65, false, 1200, 3, 0, 0);
    aggregator
        .handle_advertisement("aa:aa:aa:aa:aa:aa", 0x03, &payload, SystemTime::now())
        .unwrap();

    assert_eq!(aggregator.state("aa:aa:aa:aa:aa:aa"), SensorState::Active);
    assert_eq!(aggregator.state("bb:bb:bb:bb:bb:bb"), SensorState::Unseen);
}

#[test]
fn test_unconfigured_identity_is_dropped() {
    let mut aggregator = Aggregator::new();
    let payload = encode_pro(0x03, 0x50, 65, false, 1200, 3, 0, 0);
    let outcome = aggregator
        .handle_advertisement(ADDRESS, 0x03, &payload, SystemTime::now())
        .unwrap();
    assert_eq!(outcome, Outcome::NotConfigured);
}

#[test]
fn test_remove_sensor_tears_down_state() {
    let mut aggregator = Aggregator::new();
    aggregator.add_sensor(ADDRESS, propane_250gal(0));
    assert!(aggregator.is_configured(ADDRESS));
    assert!(aggregator.remove_sensor(ADDRESS));
    assert!(!aggregator.is_configured(ADDRESS));
    assert!(!aggregator.remove_sensor(ADDRESS));
    assert_eq!(aggregator.state(ADDRESS), SensorState::Unseen);
}
