//! Decoder for Mopeka manufacturer-data payloads.
//!
//! The on-air format is compact and varies by model. All current models
//! share the same prefix:
//!
//! Byte | Meaning
//! 0    | Hardware id (selects the model and layout)
//! 1    | Battery voltage code, volts = code / 32
//! 2    | Bits 0-6: temperature code (°C + 40), bit 7: sync button held
//!
//! The Pro-series layout then packs distance and quality together:
//!
//! Byte | Meaning
//! 3    | Distance low byte
//! 4    | Bits 0-5: distance high bits, bits 6-7: quality code
//! 8    | Accelerometer X (signed)
//! 9    | Accelerometer Y (signed)
//!
//! while the top-down (TD40/TD200) layout carries a full 16-bit distance
//! in bytes 3-4 followed by a standalone quality byte at byte 5.
//!
//! Decoding is a pure function: identical bytes always yield an identical
//! [`RawReading`] or an identical [`DecodeError`]. A field whose value
//! lies outside its valid code range is rejected, never clamped.

use crate::error::DecodeError;
use crate::model::{self, PayloadLayout, SensorModel};
use crate::reading::RawReading;

/// The temperature code the sensor emits when it has no valid
/// temperature measurement.
const TEMPERATURE_INVALID_CODE: u8 = 0x7F;

/// Decode a single manufacturer-data payload.
///
/// `hardware_id` is the first byte of the manufacturer data, passed
/// separately so the caller can route on it before committing to a
/// decode. Fails with [`DecodeError::UnknownModel`] if no model matches,
/// [`DecodeError::TruncatedPayload`] if the payload is shorter than the
/// model's layout requires, and [`DecodeError::FieldOutOfRange`] if a
/// field violates its valid-value contract.
pub fn decode(hardware_id: u8, payload: &[u8]) -> Result<RawReading, DecodeError> {
    let model = model::lookup(hardware_id).ok_or(DecodeError::UnknownModel(hardware_id))?;

    if payload.len() < model.min_payload_len {
        return Err(DecodeError::TruncatedPayload {
            expected: model.min_payload_len,
            actual: payload.len(),
        });
    }

    let battery_raw = payload[1];
    let raw_temperature = decode_temperature(payload[2])?;
    let sync_button_pressed = if model.has_sync_button {
        Some(payload[2] & 0x80 != 0)
    } else {
        None
    };

    let (raw_distance, quality_raw) = match model.layout {
        PayloadLayout::ProSeries => decode_pro_distance(payload[3], payload[4]),
        PayloadLayout::TopDown => decode_top_down_distance(model, payload)?,
    };

    let (accel_x, accel_y) = if model.has_accelerometer {
        (Some(payload[8] as i8), Some(payload[9] as i8))
    } else {
        (None, None)
    };

    Ok(RawReading {
        hardware_id,
        raw_distance,
        raw_temperature,
        battery_raw,
        quality_raw,
        accel_x,
        accel_y,
        sync_button_pressed,
    })
}

fn decode_temperature(byte: u8) -> Result<i16, DecodeError> {
    let code = byte & 0x7F;
    if code == TEMPERATURE_INVALID_CODE {
        return Err(DecodeError::FieldOutOfRange {
            field: "temperature",
            value: u16::from(code),
        });
    }
    Ok(i16::from(code))
}

/// Distance bits 0-13 little-endian, quality in bits 14-15. The bit
/// ranges are isolated with masks so no sign extension can occur.
fn decode_pro_distance(low: u8, high: u8) -> (u16, u8) {
    let word = u16::from_le_bytes([low, high]);
    let distance = word & 0x3FFF;
    let quality = (word >> 14) as u8;
    (distance, quality)
}

fn decode_top_down_distance(
    model: &SensorModel,
    payload: &[u8],
) -> Result<(u16, u8), DecodeError> {
    let distance = u16::from_le_bytes([payload[3], payload[4]]);
    let quality = payload[5];
    if quality >= model.max_quality_levels {
        return Err(DecodeError::FieldOutOfRange {
            field: "quality",
            value: u16::from(quality),
        });
    }
    Ok((distance, quality))
}

/// Build a Pro-series payload with the given field values, for checking
/// layout offsets against the decoder.
#[cfg(test)]
pub(crate) fn encode_pro(
    hardware_id: u8,
    battery_raw: u8,
    temperature_code: u8,
    sync: bool,
    distance: u16,
    quality: u8,
    accel_x: i8,
    accel_y: i8,
) -> Vec<u8> {
    let word = (distance & 0x3FFF) | (u16::from(quality) << 14);
    let [low, high] = word.to_le_bytes();
    vec![
        hardware_id,
        battery_raw,
        (temperature_code & 0x7F) | if sync { 0x80 } else { 0 },
        low,
        high,
        0x00,
        0x00,
        0x00,
        accel_x as u8,
        accel_y as u8,
    ]
}

#[cfg(test)]
pub(crate) fn encode_top_down(
    hardware_id: u8,
    battery_raw: u8,
    temperature_code: u8,
    distance: u16,
    quality: u8,
) -> Vec<u8> {
    let [low, high] = distance.to_le_bytes();
    vec![hardware_id, battery_raw, temperature_code & 0x7F, low, high, quality]
}

#[test]
fn test_decode_pro_series_round_trip() {
    let payload = encode_pro(0x0D, 0x50, 65, false, 1200, 3, -5, 17);
    let reading = decode(0x0D, &payload).unwrap();
    assert_eq!(reading.hardware_id, 0x0D);
    assert_eq!(reading.battery_raw, 0x50);
    assert_eq!(reading.raw_temperature, 65);
    assert_eq!(reading.temperature_celsius(), 25);
    assert_eq!(reading.raw_distance, 1200);
    assert_eq!(reading.quality_raw, 3);
    assert_eq!(reading.accel_x, Some(-5));
    assert_eq!(reading.accel_y, Some(17));
    assert_eq!(reading.sync_button_pressed, Some(false));
}

#[test]
fn test_decode_top_down_round_trip() {
    let payload = encode_top_down(0x0B, 0x42, 30, 2500, 2);
    let reading = decode(0x0B, &payload).unwrap();
    assert_eq!(reading.raw_distance, 2500);
    assert_eq!(reading.quality_raw, 2);
    assert_eq!(reading.temperature_celsius(), -10);
    assert_eq!(reading.accel_x, None);
    assert_eq!(reading.accel_y, None);
}

#[test]
fn test_decode_is_deterministic() {
    let payload = hex::decode("03504fb0c4000000f30a").unwrap();
    let first = decode(0x03, &payload).unwrap();
    let second = decode(0x03, &payload).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_decode_unknown_model() {
    let payload = [0x07u8; 10];
    assert_eq!(decode(0x07, &payload), Err(DecodeError::UnknownModel(0x07)));
}

#[test]
fn test_decode_truncated_payload() {
    let payload = encode_pro(0x03, 0x50, 65, false, 1200, 3, 0, 0);
    for len in 0..payload.len() {
        assert_eq!(
            decode(0x03, &payload[..len]),
            Err(DecodeError::TruncatedPayload { expected: 10, actual: len })
        );
    }
}

#[test]
fn test_decode_quality_packed_in_top_bits() {
    // Distance at the 14-bit maximum must not bleed into the quality code
    let payload = encode_pro(0x03, 0x50, 65, false, 0x3FFF, 0, 0, 0);
    let reading = decode(0x03, &payload).unwrap();
    assert_eq!(reading.raw_distance, 0x3FFF);
    assert_eq!(reading.quality_raw, 0);
}

#[test]
fn test_decode_rejects_invalid_temperature() {
    let payload = encode_pro(0x03, 0x50, 0x7F, false, 1200, 3, 0, 0);
    assert_eq!(
        decode(0x03, &payload),
        Err(DecodeError::FieldOutOfRange { field: "temperature", value: 0x7F })
    );
}

#[test]
fn test_decode_rejects_invalid_quality() {
    let payload = encode_top_down(0x0C, 0x50, 65, 2500, 9);
    assert_eq!(
        decode(0x0C, &payload),
        Err(DecodeError::FieldOutOfRange { field: "quality", value: 9 })
    );
}

#[test]
fn test_decode_sync_button() {
    let payload = encode_pro(0x04, 0x50, 65, true, 1200, 3, 0, 0);
    let reading = decode(0x04, &payload).unwrap();
    assert_eq!(reading.sync_button_pressed, Some(true));
    // The sync bit must not leak into the temperature code
    assert_eq!(reading.raw_temperature, 65);
}
