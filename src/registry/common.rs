// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fields every child device reports under `common`.
//!
//! This is also the generic table used for device types without a
//! dedicated one.

use super::descriptor::{Conversion, EntityDescriptor};
use super::labels;
use crate::types::Unit;

/// Common child device fields.
pub const COMMON: &[EntityDescriptor] = &[
    EntityDescriptor::sensor("name", "Name", "common.name").convert(Conversion::Text),
    EntityDescriptor::sensor("priority", "Priority", "common.priority").diagnostic(),
    EntityDescriptor::sensor("status", "Status", "common.status")
        .convert(Conversion::Enum(labels::DEVICE_STATUS))
        .diagnostic(),
    EntityDescriptor::sensor("signal", "WiFi Signal", "common.signal")
        .unit(Unit::Decibel)
        .diagnostic(),
    EntityDescriptor::sensor("device_type", "Device Type", "common.type")
        .convert(Conversion::Enum(labels::DEVICE_TYPE)),
    EntityDescriptor::sensor("serial_number", "Serial Number", "common.sn")
        .convert(Conversion::Text),
    EntityDescriptor::sensor("fw_version", "FW Version", "common.fw")
        .convert(Conversion::Text)
        .diagnostic(),
    EntityDescriptor::sensor("hw_version", "HW Version", "common.hw")
        .convert(Conversion::Text)
        .diagnostic(),
];
