// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data normalizer.
//!
//! Turns raw router payloads into [`DeviceSnapshot`]s using the read paths
//! and conversions declared in the [`Registry`]. Normalization is pure:
//! unknown payload members are ignored and missing members only mark the
//! affected field as missing.

mod convert;
pub mod path;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

pub use convert::{convert, is_missing, number};

use crate::error::ParseError;
use crate::protocol::MasterPayload;
use crate::registry::{EntityDescriptor, ReadPath, Registry};
use crate::snapshot::{ChildDevice, DeviceSnapshot, MasterSnapshot};
use crate::types::{DeviceId, DeviceIdentity, DeviceType, FieldValue};

/// Normalizes a raw payload, stamped with the current time.
#[must_use]
pub fn normalize(device_type: &DeviceType, raw: &Value, registry: &Registry) -> DeviceSnapshot {
    normalize_at(device_type, raw, registry, Utc::now())
}

/// Normalizes a raw payload with an explicit timestamp.
///
/// Every descriptor of the device type ends up either in `fields` or in
/// `missing`, never both.
#[must_use]
pub fn normalize_at(
    device_type: &DeviceType,
    raw: &Value,
    registry: &Registry,
    at: DateTime<Utc>,
) -> DeviceSnapshot {
    let mut snapshot = DeviceSnapshot::new(device_type.clone(), at);
    for descriptor in registry.entries_for(device_type) {
        match read_field(descriptor, raw) {
            Some(value) => {
                snapshot.fields.insert(descriptor.field.to_string(), value);
            }
            None => {
                snapshot.missing.insert(descriptor.field.to_string());
            }
        }
    }
    snapshot
}

/// Reads and converts one descriptor's value from a payload.
#[must_use]
pub fn read_field(descriptor: &EntityDescriptor, raw: &Value) -> Option<FieldValue> {
    match descriptor.read {
        ReadPath::Path(p) => path::lookup(raw, p).and_then(|v| convert(descriptor.conversion, v)),
        ReadPath::Sum(paths) => paths
            .iter()
            .map(|p| path::lookup(raw, p).and_then(number))
            .sum::<Option<f64>>()
            .map(FieldValue::Number),
    }
}

/// Normalizes the master aggregate.
///
/// The master's own fields are read from the composite
/// `{"power", "status", "settings"}` document. Child devices without a
/// usable `common.id` are skipped; a repeated id keeps its first occurrence.
#[must_use]
pub fn normalize_master(payload: &MasterPayload, registry: &Registry) -> MasterSnapshot {
    let snapshot = normalize(&DeviceType::Master, &payload.document(), registry);

    let mut seen = HashSet::new();
    let mut devices = Vec::with_capacity(payload.devices.len());
    for raw in &payload.devices {
        match device_identity(raw) {
            Ok(identity) if seen.insert(identity.device_id.clone()) => {
                devices.push(ChildDevice {
                    identity,
                    payload: raw.clone(),
                });
            }
            Ok(identity) => {
                tracing::warn!(device_id = %identity.device_id, "Duplicate device id in device list");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Skipping device without identity");
            }
        }
    }

    MasterSnapshot {
        snapshot,
        devices,
        settings: payload.settings.clone(),
    }
}

/// Derives the identity of a child device from its payload.
///
/// # Errors
///
/// Returns [`ParseError::MissingField`] if `common.id` is absent or empty.
pub fn device_identity(raw: &Value) -> Result<DeviceIdentity, ParseError> {
    let device_id = path::lookup(raw, "common.id")
        .and_then(DeviceId::from_json)
        .ok_or_else(|| ParseError::MissingField("common.id".to_string()))?;
    let device_type = DeviceType::from_json(raw.get("deviceType"));
    let display_name = path::lookup(raw, "common.name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("device-{device_id}"), str::to_string);
    Ok(DeviceIdentity::new(device_id, device_type, display_name))
}

/// Extracts the device list from a devices response.
///
/// Accepts either a bare list or an object with a `devices` list.
///
/// # Errors
///
/// Returns [`ParseError::UnexpectedFormat`] for any other shape.
pub fn device_list(body: Value) -> Result<Vec<Value>, ParseError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("devices") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ParseError::UnexpectedFormat(
                "object without a devices list".to_string(),
            )),
        },
        other => Err(ParseError::UnexpectedFormat(format!(
            "expected a device list, got {other}"
        ))),
    }
}
