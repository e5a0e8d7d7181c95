// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized field values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Typed value of one snapshot field.
///
/// # Examples
///
/// ```
/// use azrouter_lib::types::FieldValue;
///
/// let power = FieldValue::Number(1250.0);
/// assert_eq!(power.as_f64(), Some(1250.0));
///
/// let boost = FieldValue::Bool(true);
/// assert_eq!(boost.as_bool(), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Numeric measurement, already converted to the field's unit.
    Number(f64),
    /// Boolean state.
    Bool(bool),
    /// Free text.
    Text(String),
    /// Enumerated status: the raw code and its label when the code is known.
    Status {
        /// Raw code reported by the device.
        code: i64,
        /// Human readable label.
        label: Option<String>,
    },
    /// Point in time.
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Returns the numeric value, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text value, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the status code, if this is an enumerated status.
    #[must_use]
    pub fn status_code(&self) -> Option<i64> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Text(v) => f.write_str(v),
            Self::Status {
                label: Some(label), ..
            } => f.write_str(label),
            Self::Status { code, label: None } => write!(f, "{code}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Value carried by a write command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandValue {
    /// Switch state.
    Bool(bool),
    /// Numeric setting.
    Number(f64),
}

impl CommandValue {
    /// Returns the value the router expects on the wire: `0`/`1` for
    /// switches, a whole number for numeric settings.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Self::Bool(on) => serde_json::Value::from(u8::from(*on)),
            // Validated values are whole numbers well inside the i64 range.
            #[allow(clippy::cast_possible_truncation)]
            Self::Number(v) => serde_json::Value::from(v.round() as i64),
        }
    }
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(on) => write!(f, "{on}"),
            Self::Number(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_status_prefers_label() {
        let known = FieldValue::Status {
            code: 1,
            label: Some("online".to_string()),
        };
        let unknown = FieldValue::Status {
            code: 9,
            label: None,
        };
        assert_eq!(known.to_string(), "online");
        assert_eq!(unknown.to_string(), "9");
    }

    #[test]
    fn command_value_wire_format() {
        assert_eq!(CommandValue::Bool(true).to_wire(), serde_json::json!(1));
        assert_eq!(CommandValue::Bool(false).to_wire(), serde_json::json!(0));
        assert_eq!(CommandValue::Number(-250.0).to_wire(), serde_json::json!(-250));
    }

    #[test]
    fn accessors_reject_other_kinds() {
        assert_eq!(FieldValue::Bool(true).as_f64(), None);
        assert_eq!(FieldValue::Number(1.0).as_bool(), None);
        assert_eq!(FieldValue::Text("x".into()).as_text(), Some("x"));
    }
}
