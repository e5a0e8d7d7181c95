// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device types and identities.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DeviceId;

/// The kind of unit a snapshot or entity belongs to.
///
/// Child devices report their kind as a `deviceType` code. Codes without a
/// dedicated entity table are kept as [`DeviceType::Unknown`] so that they
/// can still be exposed through the generic table, or given their own table
/// later.
///
/// # Examples
///
/// ```
/// use azrouter_lib::types::DeviceType;
///
/// assert_eq!(DeviceType::from_code("1"), DeviceType::Slave);
/// assert_eq!(DeviceType::from_code("4"), DeviceType::ChargerCube);
/// assert_eq!(DeviceType::from_code("5"), DeviceType::Unknown("5".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// The aggregating master unit.
    Master,
    /// Smart slave driving a resistive load (boiler), `deviceType` 1.
    Slave,
    /// Charger cube (wallbox), `deviceType` 4.
    ChargerCube,
    /// Any other `deviceType` code.
    Unknown(String),
}

impl DeviceType {
    /// Resolves a child device type from its `deviceType` code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::Slave,
            "4" => Self::ChargerCube,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Reads the `deviceType` code from a JSON value (number or string).
    #[must_use]
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => Self::from_code(&n.to_string()),
            Some(Value::String(s)) => Self::from_code(s),
            _ => Self::Unknown(String::new()),
        }
    }

    /// Returns the model name shown in device information.
    #[must_use]
    pub fn model(&self) -> &'static str {
        match self {
            Self::Master => "A-Z Router Smart master",
            Self::Slave => "A-Z Router Smart slave",
            Self::ChargerCube => "A-Z Charger",
            Self::Unknown(code) if code == "5" => "Inverter",
            Self::Unknown(_) => "A-Z Router Device",
        }
    }

    /// Returns `true` for the master unit.
    #[must_use]
    pub fn is_master(&self) -> bool {
        matches!(self, Self::Master)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => f.write_str("master"),
            Self::Slave => f.write_str("slave"),
            Self::ChargerCube => f.write_str("charger cube"),
            Self::Unknown(code) => write!(f, "device type {code}"),
        }
    }
}

/// Identity of one physical unit: id, type and display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Stable identifier, the join key between snapshots and entities.
    pub device_id: DeviceId,
    /// Kind of unit.
    pub device_type: DeviceType,
    /// Name shown to users.
    pub display_name: String,
}

impl DeviceIdentity {
    /// Id used for the master unit.
    pub const MASTER_ID: &'static str = "master";

    /// Creates an identity.
    #[must_use]
    pub fn new(
        device_id: DeviceId,
        device_type: DeviceType,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            device_id,
            device_type,
            display_name: display_name.into(),
        }
    }

    /// Identity of the master unit.
    #[must_use]
    pub fn master() -> Self {
        Self::new(DeviceId::new(Self::MASTER_ID), DeviceType::Master, "Master")
    }
}
