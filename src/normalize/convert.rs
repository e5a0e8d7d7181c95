// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw JSON value to [`FieldValue`] conversions.

use chrono::{DateTime, Datelike, Utc};
use serde_json::Value;

use crate::registry::Conversion;
use crate::types::FieldValue;

const MISSING_MARKERS: &[&str] = &["", "n/a", "na", "none", "-"];

/// Epoch values above this are milliseconds.
const TIMESTAMP_MS_THRESHOLD: f64 = 1e12;

/// Uptimes above this are milliseconds.
const UPTIME_MS_THRESHOLD: f64 = 1e9;

/// Converts a raw value. `None` means the field is missing.
#[must_use]
pub fn convert(conversion: Conversion, raw: &Value) -> Option<FieldValue> {
    if is_missing(raw) {
        return None;
    }
    match conversion {
        Conversion::Number => number(raw).map(FieldValue::Number),
        Conversion::Scale(factor) => number(raw).map(|n| FieldValue::Number(round3(n * factor))),
        Conversion::Bool => boolean(raw).map(FieldValue::Bool),
        Conversion::Enum(labels) => status(raw, labels),
        Conversion::Text => text(raw).map(FieldValue::Text),
        Conversion::Mac => text(raw).map(|s| FieldValue::Text(mac(&s))),
        Conversion::Timestamp => number(raw).and_then(timestamp).map(FieldValue::Timestamp),
        Conversion::Uptime => number(raw).map(|n| {
            let seconds = if n > UPTIME_MS_THRESHOLD { n / 1000.0 } else { n };
            FieldValue::Number(seconds.floor())
        }),
    }
}

/// Returns `true` for null and the placeholder strings devices report.
#[must_use]
pub fn is_missing(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            MISSING_MARKERS.contains(&s.as_str())
        }
        _ => false,
    }
}

/// Reads a number from a number, a numeric string or a boolean.
#[must_use]
pub fn number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn boolean(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" => Some(true),
            "off" | "false" | "no" => Some(false),
            _ => number(raw).map(|n| n != 0.0),
        },
        _ => number(raw).map(|n| n != 0.0),
    }
}

fn status(raw: &Value, labels: &[&str]) -> Option<FieldValue> {
    if let Some(n) = number(raw)
        && n.fract() == 0.0
    {
        // Codes are small non-negative integers.
        #[allow(clippy::cast_possible_truncation)]
        let code = n as i64;
        let label = usize::try_from(code)
            .ok()
            .and_then(|i| labels.get(i))
            .map(|l| (*l).to_string());
        return Some(FieldValue::Status { code, label });
    }
    // Some firmware reports the label instead of the code.
    let s = raw.as_str()?.trim();
    let position = labels.iter().position(|l| l.eq_ignore_ascii_case(s))?;
    Some(FieldValue::Status {
        code: i64::try_from(position).ok()?,
        label: Some(labels[position].to_string()),
    })
}

fn text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn mac(raw: &str) -> String {
    let hex: String = raw
        .chars()
        .filter(|c| !matches!(c, ':' | '-') && !c.is_whitespace())
        .collect();
    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return raw.to_string();
    }
    let hex = hex.to_ascii_uppercase();
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

fn timestamp(epoch: f64) -> Option<DateTime<Utc>> {
    let seconds = if epoch > TIMESTAMP_MS_THRESHOLD {
        epoch / 1000.0
    } else {
        epoch
    };
    // Anything outside 2000-2100 is a device without a clock.
    #[allow(clippy::cast_possible_truncation)]
    let at = DateTime::from_timestamp(seconds.trunc() as i64, 0)?;
    (2000..=2100).contains(&at.year()).then_some(at)
}

fn round3(n: f64) -> f64 {
    (n * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::labels;

    #[test]
    fn placeholders_are_missing() {
        for raw in [json!(null), json!(""), json!(" N/A "), json!("none"), json!("-")] {
            assert_eq!(convert(Conversion::Number, &raw), None, "{raw}");
        }
    }

    #[test]
    fn numeric_strings_are_parsed() {
        assert_eq!(
            convert(Conversion::Number, &json!("42.5")),
            Some(FieldValue::Number(42.5))
        );
        assert_eq!(convert(Conversion::Number, &json!("abc")), None);
    }

    #[test]
    fn scale_rounds_to_three_decimals() {
        assert_eq!(
            convert(Conversion::Scale(0.001), &json!(230_123)),
            Some(FieldValue::Number(230.123))
        );
        assert_eq!(
            convert(Conversion::Scale(0.001), &json!(1_234.5678)),
            Some(FieldValue::Number(1.235))
        );
    }

    #[test]
    fn booleans() {
        assert_eq!(convert(Conversion::Bool, &json!(1)), Some(FieldValue::Bool(true)));
        assert_eq!(convert(Conversion::Bool, &json!("off")), Some(FieldValue::Bool(false)));
        assert_eq!(convert(Conversion::Bool, &json!(true)), Some(FieldValue::Bool(true)));
        assert_eq!(convert(Conversion::Bool, &json!("maybe")), None);
    }

    #[test]
    fn enum_codes_map_to_labels() {
        assert_eq!(
            convert(Conversion::Enum(labels::CHARGE_STATUS), &json!(2)),
            Some(FieldValue::Status {
                code: 2,
                label: Some("Charging".to_string())
            })
        );
        assert_eq!(
            convert(Conversion::Enum(labels::GRID), &json!(7)),
            Some(FieldValue::Status { code: 7, label: None })
        );
        assert_eq!(
            convert(Conversion::Enum(labels::MODE), &json!("winter")),
            Some(FieldValue::Status {
                code: 1,
                label: Some("Winter".to_string())
            })
        );
    }

    #[test]
    fn mac_is_normalized() {
        assert_eq!(
            convert(Conversion::Mac, &json!("a4-cf-12-0b-3c-de")),
            Some(FieldValue::Text("A4:CF:12:0B:3C:DE".to_string()))
        );
        assert_eq!(
            convert(Conversion::Mac, &json!("not-a-mac")),
            Some(FieldValue::Text("not-a-mac".to_string()))
        );
    }

    #[test]
    fn timestamps_accept_seconds_and_millis() {
        let expected = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            convert(Conversion::Timestamp, &json!(1_700_000_000)),
            Some(FieldValue::Timestamp(expected))
        );
        assert_eq!(
            convert(Conversion::Timestamp, &json!(1_700_000_000_000_i64)),
            Some(FieldValue::Timestamp(expected))
        );
    }

    #[test]
    fn timestamps_outside_window_are_missing() {
        assert_eq!(convert(Conversion::Timestamp, &json!(0)), None);
        assert_eq!(convert(Conversion::Timestamp, &json!(5_000_000_000_i64)), None);
    }

    #[test]
    fn uptime_in_millis() {
        assert_eq!(
            convert(Conversion::Uptime, &json!(90_061)),
            Some(FieldValue::Number(90_061.0))
        );
        assert_eq!(
            convert(Conversion::Uptime, &json!(90_061_500_i64 * 100)),
            Some(FieldValue::Number(9_006_150.0))
        );
    }
}
