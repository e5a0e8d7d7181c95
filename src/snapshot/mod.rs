// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized device state.
//!
//! - [`DeviceSnapshot`] - typed fields of one unit at the last successful read
//! - [`MasterSnapshot`] - the master's own fields plus the visible child devices
//! - [`ChildDevice`] - identity and raw payload of one child device

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::types::{DeviceId, DeviceIdentity, DeviceType, FieldValue};

/// Normalized state of one unit.
///
/// `fields` holds the values that were readable; `missing` names the fields
/// the device type declares but the payload did not carry. A missing field
/// means "not applicable", never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    /// Device type the snapshot was normalized with.
    pub device_type: DeviceType,
    /// Field name to value.
    pub fields: BTreeMap<String, FieldValue>,
    /// Declared fields absent from the payload.
    pub missing: BTreeSet<String>,
    /// Time of the read this snapshot comes from.
    pub last_updated: DateTime<Utc>,
    /// Whether the last read of this unit succeeded.
    pub available: bool,
}

impl DeviceSnapshot {
    /// Creates an empty, available snapshot.
    #[must_use]
    pub fn new(device_type: DeviceType, last_updated: DateTime<Utc>) -> Self {
        Self {
            device_type,
            fields: BTreeMap::new(),
            missing: BTreeSet::new(),
            last_updated,
            available: true,
        }
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns the value of a field as a number.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    /// Returns the value of a field as a boolean.
    #[must_use]
    pub fn flag(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(FieldValue::as_bool)
    }

    /// Returns `true` if the field is declared but was not reported.
    #[must_use]
    pub fn is_missing(&self, field: &str) -> bool {
        self.missing.contains(field)
    }

    /// Returns a copy marked unavailable, keeping the last known values.
    #[must_use]
    pub fn unavailable(&self) -> Self {
        Self {
            available: false,
            ..self.clone()
        }
    }
}

/// One child device as listed by the master.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildDevice {
    /// Identity derived from the payload.
    pub identity: DeviceIdentity,
    /// Raw payload as listed by the master.
    pub payload: Value,
}

/// The master's aggregate view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterSnapshot {
    /// The master's own normalized fields.
    pub snapshot: DeviceSnapshot,
    /// Child devices visible this cycle, in master order.
    pub devices: Vec<ChildDevice>,
    /// Raw master settings document.
    pub settings: Value,
}

impl MasterSnapshot {
    /// Identities of the visible child devices, in master order.
    pub fn identities(&self) -> impl Iterator<Item = &DeviceIdentity> {
        self.devices.iter().map(|d| &d.identity)
    }

    /// Finds a child device by id.
    #[must_use]
    pub fn device(&self, id: &DeviceId) -> Option<&ChildDevice> {
        self.devices.iter().find(|d| &d.identity.device_id == id)
    }
}
