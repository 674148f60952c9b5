use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A resolved sensor reading: a number when the raw state parses as a finite
/// number, the raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Parse a raw state string opportunistically.
    ///
    /// Surrounding whitespace is ignored and a blank string reads as zero,
    /// matching how the front end coerces states to numbers.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Number(0.0);
        }
        match parse_number(trimmed) {
            Some(n) => FieldValue::Number(n),
            None => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Numeric zero and empty text count as "nothing there".
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Number(n) => *n != 0.0,
            FieldValue::Text(s) => !s.is_empty(),
        }
    }

    /// Best-effort number for display arithmetic: text that still parses
    /// counts, anything else is zero.
    pub fn to_seconds(&self) -> f64 {
        match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => parse_number(s.trim()).unwrap_or(0.0),
        }
    }
}

/// Finite decimal or exponent notation, or an unsigned `0x`/`0o`/`0b`
/// integer literal.
fn parse_number(s: &str) -> Option<f64> {
    let radix = match s.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };

    match radix {
        Some(radix) => {
            let digits = &s[2..];
            if digits.is_empty() {
                return None;
            }
            digits.chars().try_fold(0.0, |acc: f64, c| {
                c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
            })
        }
        None => s.parse::<f64>().ok().filter(|n| n.is_finite()),
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Zero loses its sign; very large and very small magnitudes use
            // exponent form with an explicit sign (`1e+21`, `1e-7`).
            FieldValue::Number(n) if *n == 0.0 => f.write_str("0"),
            FieldValue::Number(n) if n.abs() >= 1e21 || n.abs() < 1e-6 => {
                let exp = format!("{:e}", n);
                match exp.split_once('e') {
                    Some((mantissa, power)) if !power.starts_with('-') => {
                        write!(f, "{}e+{}", mantissa, power)
                    }
                    _ => f.write_str(&exp),
                }
            }
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// Aggregated view of one printer at one tick.
///
/// Every field except `model` is optional; `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Hardware model, or the printer key when no entity reports one.
    pub model: String,
    pub online: Option<bool>,
    pub webcam_url: Option<String>,
    pub current_file_image: Option<String>,
    pub file: Option<FieldValue>,
    pub state_text: Option<FieldValue>,
    pub state_code: Option<FieldValue>,
    pub progress: Option<FieldValue>,
    pub layer: Option<FieldValue>,
    pub total_layers: Option<FieldValue>,
    pub elapsed_sec: Option<FieldValue>,
    pub remaining_sec: Option<FieldValue>,
    pub nozzle_temp: Option<FieldValue>,
    pub nozzle_target: Option<FieldValue>,
    pub bed_temp: Option<FieldValue>,
    pub bed_target: Option<FieldValue>,
    pub chamber_temp: Option<FieldValue>,
}

impl StatusSnapshot {
    /// Whether the printer reports an active print, by text or by code.
    pub fn is_printing(&self) -> bool {
        matches!(&self.state_text, Some(FieldValue::Text(s)) if s == "Printing")
            || matches!(&self.state_code, Some(FieldValue::Text(s)) if s == "printing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_and_text() {
        assert_eq!(FieldValue::parse("45"), FieldValue::Number(45.0));
        assert_eq!(FieldValue::parse(" 60.5 "), FieldValue::Number(60.5));
        assert_eq!(FieldValue::parse("1e3"), FieldValue::Number(1000.0));
        assert_eq!(FieldValue::parse("-3"), FieldValue::Number(-3.0));
        assert_eq!(FieldValue::parse(""), FieldValue::Number(0.0));
        assert_eq!(
            FieldValue::parse("Printing"),
            FieldValue::Text("Printing".to_string())
        );
        assert_eq!(FieldValue::parse("inf"), FieldValue::Text("inf".to_string()));
        assert_eq!(FieldValue::parse("NaN"), FieldValue::Text("NaN".to_string()));
    }

    #[test]
    fn test_parse_prefixed_integers() {
        assert_eq!(FieldValue::parse("0x1A"), FieldValue::Number(26.0));
        assert_eq!(FieldValue::parse("0X1a"), FieldValue::Number(26.0));
        assert_eq!(FieldValue::parse("0o17"), FieldValue::Number(15.0));
        assert_eq!(FieldValue::parse("0b101"), FieldValue::Number(5.0));
        assert_eq!(FieldValue::parse("-0x1A"), FieldValue::from("-0x1A"));
        assert_eq!(FieldValue::parse("0x"), FieldValue::from("0x"));
        assert_eq!(FieldValue::parse("0x+1"), FieldValue::from("0x+1"));
        assert_eq!(FieldValue::parse("0b102"), FieldValue::from("0b102"));

        assert_eq!(FieldValue::from("0x3C").to_seconds(), 60.0);
        assert_eq!(FieldValue::from("-0x3C").to_seconds(), 0.0);
    }

    #[test]
    fn test_display_extremes() {
        assert_eq!(FieldValue::parse("-0").to_string(), "0");
        assert_eq!(FieldValue::Number(1e21).to_string(), "1e+21");
        assert_eq!(FieldValue::Number(-2.5e22).to_string(), "-2.5e+22");
        assert_eq!(FieldValue::Number(1e-7).to_string(), "1e-7");
        assert_eq!(FieldValue::Number(1e20).to_string(), "100000000000000000000");
        assert_eq!(FieldValue::Number(0.000001).to_string(), "0.000001");
    }

    #[test]
    fn test_display_matches_front_end() {
        assert_eq!(FieldValue::Number(45.0).to_string(), "45");
        assert_eq!(FieldValue::Number(60.5).to_string(), "60.5");
        assert_eq!(FieldValue::from("benchy.gcode").to_string(), "benchy.gcode");
    }

    #[test]
    fn test_serializes_untagged() {
        let value = serde_json::to_value(FieldValue::Number(45.0)).unwrap();
        assert_eq!(value, serde_json::json!(45.0));
        let value = serde_json::to_value(FieldValue::from("idle")).unwrap();
        assert_eq!(value, serde_json::json!("idle"));
    }

    #[test]
    fn test_is_printing() {
        let mut status = StatusSnapshot::default();
        assert!(!status.is_printing());
        status.state_code = Some("printing".into());
        assert!(status.is_printing());
        status.state_code = None;
        status.state_text = Some("Printing".into());
        assert!(status.is_printing());
        status.state_text = Some("Paused".into());
        assert!(!status.is_printing());
    }
}
