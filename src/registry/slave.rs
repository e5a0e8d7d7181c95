// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smart slave (`deviceType` 1) table, on top of the common fields.

use super::descriptor::{Conversion, EntityDescriptor, NumberBounds, WritePath};
use crate::types::Unit;

/// Bounds of both boiler target temperatures.
pub const TEMPERATURE: NumberBounds = NumberBounds::new(20.0, 85.0, 5.0);

/// Bounds of the maximum routed power.
pub const MAX_POWER: NumberBounds = NumberBounds::new(100.0, 3500.0, 1.0);

/// Slave specific fields.
pub const SLAVE: &[EntityDescriptor] = &[
    EntityDescriptor::sensor("power_l1", "Power L1", "power.output.0").unit(Unit::Watt),
    EntityDescriptor::sensor("power_l2", "Power L2", "power.output.1").unit(Unit::Watt),
    EntityDescriptor::sensor("power_l3", "Power L3", "power.output.2").unit(Unit::Watt),
    EntityDescriptor::sensor("power_total", "Power Total", "power.totalPower").unit(Unit::Watt),
    EntityDescriptor::sensor("boost_source", "Boost Source", "power.boostSource").diagnostic(),
    EntityDescriptor::sensor(
        "boost_temperature_override",
        "Boost Temp Override",
        "power.boostTempOverride",
    )
    .convert(Conversion::Bool)
    .diagnostic(),
    EntityDescriptor::sensor("temperature", "Temperature", "power.temperature")
        .unit(Unit::Celsius),
    EntityDescriptor::sensor("outlet_mode", "Outlet Mode", "power.outletMode").diagnostic(),
    EntityDescriptor::switch("boost", "Boost", "power.boost", WritePath::DeviceBoost),
    EntityDescriptor::number(
        "target_temperature",
        "Target Temp.",
        "settings.0.power.targetTemperature",
        WritePath::DeviceSetting(&["settings.*.power.targetTemperature"]),
        TEMPERATURE,
    )
    .unit(Unit::Celsius),
    EntityDescriptor::number(
        "target_temperature_boost",
        "Bst Target Temp.",
        "settings.0.power.targetTemperatureBoost",
        WritePath::DeviceSetting(&["settings.*.power.targetTemperatureBoost"]),
        TEMPERATURE,
    )
    .unit(Unit::Celsius),
    EntityDescriptor::number(
        "max_power",
        "Max Power",
        "power.maxPower",
        WritePath::DeviceSetting(&["power.maxPower", "settings.*.power.max"]),
        MAX_POWER,
    )
    .unit(Unit::Watt),
];
