use super::status::FieldValue;

/// Placeholder shown for values the printer does not report.
pub const MISSING: &str = "\u{2014}";

/// Format a duration in seconds as `HH:MM:SS`.
///
/// Negative and non-finite input reads as zero and fractions are dropped.
/// Hours keep growing past two digits instead of wrapping.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// [`format_hms`] for an optional reading; unknown counts as zero.
pub fn format_duration(value: Option<&FieldValue>) -> String {
    format_hms(value.map(FieldValue::to_seconds).unwrap_or(0.0))
}

/// A reading followed by its unit, or [`MISSING`].
pub fn format_num(value: Option<&FieldValue>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => MISSING.to_string(),
    }
}

/// A reading with zero standing in for unknown (`45`, `0`).
pub fn or_zero(value: Option<&FieldValue>) -> String {
    value.map_or_else(|| "0".to_string(), FieldValue::to_string)
}
