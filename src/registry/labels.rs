// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Label tables for enumerated codes, indexed by the raw code.

/// `common.status` of a child device.
pub const DEVICE_STATUS: &[&str] = &["unpaired", "online", "offline", "error", "active"];

/// `common.type` of a child device.
pub const DEVICE_TYPE: &[&str] = &["Generic", "Power", "HDO", "Fire", "Charger", "Inverter"];

/// `charge.status` of a charger cube.
pub const CHARGE_STATUS: &[&str] = &[
    "Disconnected",
    "Waiting",
    "Charging",
    "Overheated",
    "Error",
    "Unavailable",
];

/// Per-phase grid status.
pub const GRID: &[&str] = &["Connected", "Disconnected"];

/// Master system status.
pub const SYSTEM_STATUS: &[&str] = &["Online", "Offline", "Updating"];

/// Master operating mode.
pub const MODE: &[&str] = &["Summer", "Winter"];

/// Yes/no flags reported as 0/1.
pub const YES_NO: &[&str] = &["No", "Yes"];
