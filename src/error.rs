//! Error types for advertisement decoding and sensor configuration.
//!
//! Decode failures are recoverable: each advertisement is an independent
//! event and a failure only affects that one packet. Configuration errors
//! are surfaced to the caller at configuration time, before any
//! advertisement is processed.

/// A failure to decode a single advertisement payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The hardware id byte does not match any known sensor model.
    #[error("Unknown sensor model: hardware id 0x{0:02x}")]
    UnknownModel(u8),

    /// The payload is shorter than the model's layout requires.
    #[error("Truncated payload: need {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },

    /// A decoded field value lies outside its valid code range.
    #[error("Field out of range: {field} = {value}")]
    FieldOutOfRange { field: &'static str, value: u16 },
}

/// A per-sensor configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No geometry is known for the given tank type. There is no safe
    /// geometric default, so this is a hard error.
    #[error("Unsupported tank type: {0:?}")]
    UnsupportedTankType(String),

    /// The minimum quality threshold must be one of the quality tiers.
    #[error("Invalid quality threshold {0}, must be one of 0, 20, 50 or 80")]
    InvalidQualityThreshold(u8),

    /// A custom tank profile needs at least two calibration points to
    /// interpolate between.
    #[error("Custom tank profile needs at least two calibration points")]
    InvalidCalibrationProfile,
}
