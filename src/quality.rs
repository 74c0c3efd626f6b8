//! Read-quality mapping and acceptance gate.

/// Quality percentage for each raw code 0..=3. The values double as the
/// selectable minimum-quality thresholds.
pub const QUALITY_PERCENT: [u8; 4] = [0, 20, 50, 80];

/// Map a raw quality code to a percentage and decide whether it passes
/// the configured minimum threshold.
///
/// The gate is evaluated before any level computation: a rejected
/// reading must never overwrite the last known good calibrated reading.
pub fn evaluate(quality_raw: u8, min_threshold: u8) -> (u8, bool) {
    let percent = QUALITY_PERCENT[usize::from(quality_raw.min(3))];
    (percent, percent >= min_threshold)
}

/// Whether `threshold` is one of the selectable quality tiers.
pub fn is_valid_threshold(threshold: u8) -> bool {
    QUALITY_PERCENT.contains(&threshold)
}

#[test]
fn test_quality_mapping() {
    assert_eq!(evaluate(0, 0), (0, true));
    assert_eq!(evaluate(1, 0), (20, true));
    assert_eq!(evaluate(2, 0), (50, true));
    assert_eq!(evaluate(3, 0), (80, true));
}

#[test]
fn test_quality_gate() {
    assert_eq!(evaluate(1, 50), (20, false));
    assert_eq!(evaluate(2, 50), (50, true));
    assert_eq!(evaluate(3, 80), (80, true));
    assert_eq!(evaluate(2, 80), (50, false));
}

#[test]
fn test_quality_is_monotonic() {
    let mut previous = 0;
    for code in 0..=3 {
        let (percent, _) = evaluate(code, 0);
        assert!(percent >= previous);
        previous = percent;
    }
}

#[test]
fn test_valid_thresholds() {
    for threshold in [0, 20, 50, 80] {
        assert!(is_valid_threshold(threshold));
    }
    assert!(!is_valid_threshold(33));
    assert!(!is_valid_threshold(100));
}
