// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dot-separated paths into JSON payloads.
//!
//! Segment forms:
//!
//! - `name` - object member
//! - `0`, `1`, ... - list index (an object member of that name also matches)
//! - `key=value` - first list element whose `key` equals `value`
//! - `*` - every list element (writes only)

use serde_json::{Map, Value};

use crate::error::ParseError;

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
    Select { key: &'a str, value: &'a str },
    Each,
}

fn segments(path: &str) -> impl Iterator<Item = Segment<'_>> {
    path.split('.').filter(|s| !s.is_empty()).map(|s| {
        if s == "*" {
            Segment::Each
        } else if let Some((key, value)) = s.split_once('=') {
            Segment::Select { key, value }
        } else if let Ok(index) = s.parse() {
            Segment::Index(index)
        } else {
            Segment::Key(s)
        }
    })
}

fn selects(element: &Value, key: &str, expected: &str) -> bool {
    match element.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

fn selector_value(value: &str) -> Value {
    value
        .parse::<i64>()
        .map_or_else(|_| Value::String(value.to_string()), Value::from)
}

/// Reads the value at `path`.
///
/// Returns `None` if any segment does not resolve or if the path contains a
/// `*` segment.
#[must_use]
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |node, segment| match segment {
        Segment::Key(key) => node.get(key),
        Segment::Index(index) => match node {
            Value::Array(items) => items.get(index),
            Value::Object(map) => map.get(&index.to_string()),
            _ => None,
        },
        Segment::Select { key, value } => node
            .as_array()?
            .iter()
            .find(|element| selects(element, key, value)),
        Segment::Each => None,
    })
}

/// Writes `value` at `path`, returning the number of locations written.
///
/// Missing object members along the path are created. A `key=value` segment
/// that selects nothing appends a new element `{key: value, "enabled": 1}`
/// (list entries the firmware addresses by key carry an enabled flag). A `*`
/// segment writes into every element of the list; an empty list writes
/// nothing.
///
/// # Errors
///
/// Returns [`ParseError::UnexpectedFormat`] if the path crosses a value that
/// is neither an object nor a list where one is required, or an index is out
/// of bounds.
pub fn patch(root: &mut Value, path: &str, value: &Value) -> Result<usize, ParseError> {
    let segments: Vec<Segment<'_>> = segments(path).collect();
    if segments.is_empty() {
        return Err(ParseError::UnexpectedFormat(format!("empty path {path:?}")));
    }
    patch_at(root, &segments, value, path)
}

fn patch_at(
    node: &mut Value,
    segments: &[Segment<'_>],
    value: &Value,
    path: &str,
) -> Result<usize, ParseError> {
    let Some((head, rest)) = segments.split_first() else {
        *node = value.clone();
        return Ok(1);
    };
    let unexpected = || ParseError::UnexpectedFormat(format!("cannot follow {path:?}"));

    match head {
        Segment::Key(key) => {
            if node.is_null() {
                *node = Value::Object(Map::new());
            }
            let map = node.as_object_mut().ok_or_else(unexpected)?;
            let child = map.entry((*key).to_string()).or_insert(Value::Null);
            patch_at(child, rest, value, path)
        }
        Segment::Index(index) => {
            let child = node
                .as_array_mut()
                .and_then(|items| items.get_mut(*index))
                .ok_or_else(unexpected)?;
            patch_at(child, rest, value, path)
        }
        Segment::Select { key, value: expected } => {
            if node.is_null() {
                *node = Value::Array(Vec::new());
            }
            let items = node.as_array_mut().ok_or_else(unexpected)?;
            let position = items.iter().position(|e| selects(e, key, expected));
            let child = match position {
                Some(position) => &mut items[position],
                None => {
                    let mut entry = Map::new();
                    entry.insert((*key).to_string(), selector_value(expected));
                    entry.insert("enabled".to_string(), Value::from(1));
                    items.push(Value::Object(entry));
                    items.last_mut().ok_or_else(unexpected)?
                }
            };
            patch_at(child, rest, value, path)
        }
        Segment::Each => {
            let items = node.as_array_mut().ok_or_else(unexpected)?;
            items.iter_mut().try_fold(0, |written, child| {
                Ok(written + patch_at(child, rest, value, path)?)
            })
        }
    }
}
