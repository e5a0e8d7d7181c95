// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Master unit table.
//!
//! Paths are relative to the composite master document
//! `{"power": .., "status": .., "settings": ..}`.

use super::descriptor::{Conversion, EntityDescriptor, NumberBounds, WritePath};
use super::labels;
use crate::types::Unit;

const MILLI: Conversion = Conversion::Scale(0.001);

/// Bounds of the regulation target power.
pub const TARGET_POWER: NumberBounds = NumberBounds::new(-1000.0, 1000.0, 10.0);

/// Master unit fields.
pub const MASTER: &[EntityDescriptor] = &[
    // Grid side
    EntityDescriptor::sensor("grid_voltage_l1", "Grid Voltage L1", "power.input.voltage.0.value")
        .unit(Unit::Volt)
        .convert(MILLI)
        .diagnostic(),
    EntityDescriptor::sensor("grid_voltage_l2", "Grid Voltage L2", "power.input.voltage.1.value")
        .unit(Unit::Volt)
        .convert(MILLI)
        .diagnostic(),
    EntityDescriptor::sensor("grid_voltage_l3", "Grid Voltage L3", "power.input.voltage.2.value")
        .unit(Unit::Volt)
        .convert(MILLI)
        .diagnostic(),
    EntityDescriptor::sensor("grid_current_l1", "Grid Current L1", "power.input.current.0.value")
        .unit(Unit::Ampere)
        .convert(MILLI)
        .diagnostic(),
    EntityDescriptor::sensor("grid_current_l2", "Grid Current L2", "power.input.current.1.value")
        .unit(Unit::Ampere)
        .convert(MILLI)
        .diagnostic(),
    EntityDescriptor::sensor("grid_current_l3", "Grid Current L3", "power.input.current.2.value")
        .unit(Unit::Ampere)
        .convert(MILLI)
        .diagnostic(),
    EntityDescriptor::sensor("grid_power_l1", "Grid Power L1", "power.input.power.0.value")
        .unit(Unit::Watt),
    EntityDescriptor::sensor("grid_power_l2", "Grid Power L2", "power.input.power.1.value")
        .unit(Unit::Watt),
    EntityDescriptor::sensor("grid_power_l3", "Grid Power L3", "power.input.power.2.value")
        .unit(Unit::Watt),
    EntityDescriptor::sum(
        "grid_power_total",
        "Grid Power Total",
        &[
            "power.input.power.0.value",
            "power.input.power.1.value",
            "power.input.power.2.value",
        ],
    )
    .unit(Unit::Watt),
    EntityDescriptor::sensor("grid_status_l1", "Grid Status L1", "power.input.status.0.value")
        .convert(Conversion::Enum(labels::GRID))
        .diagnostic(),
    EntityDescriptor::sensor("grid_status_l2", "Grid Status L2", "power.input.status.1.value")
        .convert(Conversion::Enum(labels::GRID))
        .diagnostic(),
    EntityDescriptor::sensor("grid_status_l3", "Grid Status L3", "power.input.status.2.value")
        .convert(Conversion::Enum(labels::GRID))
        .diagnostic(),
    // Load side
    EntityDescriptor::sensor("routed_power_l1", "Routed Power L1", "power.output.power.0.value")
        .unit(Unit::Watt),
    EntityDescriptor::sensor("routed_power_l2", "Routed Power L2", "power.output.power.1.value")
        .unit(Unit::Watt),
    EntityDescriptor::sensor("routed_power_l3", "Routed Power L3", "power.output.power.2.value")
        .unit(Unit::Watt),
    EntityDescriptor::sensor("routed_power_total", "Routed Power Total", "power.output.power.3.value")
        .unit(Unit::Watt),
    EntityDescriptor::sensor("saved_energy_total", "Saved Energy Total", "power.output.energy.0.value")
        .unit(Unit::KilowattHour),
    EntityDescriptor::sensor("saved_energy_year", "Saved Energy This Year", "power.output.energy.1.value")
        .unit(Unit::KilowattHour),
    EntityDescriptor::sensor("saved_energy_month", "Saved Energy This Month", "power.output.energy.2.value")
        .unit(Unit::KilowattHour),
    EntityDescriptor::sensor("saved_energy_week", "Saved Energy This Week", "power.output.energy.3.value")
        .unit(Unit::KilowattHour),
    EntityDescriptor::sensor("saved_energy_today", "Saved Energy Today", "power.output.energy.4.value")
        .unit(Unit::KilowattHour),
    EntityDescriptor::sensor("last_update", "Last Update", "power.lastUpdate")
        .convert(Conversion::Timestamp),
    // System
    EntityDescriptor::sensor("system_status", "System Status", "status.system.status")
        .convert(Conversion::Enum(labels::SYSTEM_STATUS)),
    EntityDescriptor::sensor("hdo", "HDO", "status.system.hdo").convert(Conversion::Bool),
    EntityDescriptor::sensor("mode", "Mode", "status.system.mode")
        .convert(Conversion::Enum(labels::MODE)),
    EntityDescriptor::sensor("system_temperature", "System Temperature", "status.system.temperature")
        .unit(Unit::Celsius)
        .diagnostic(),
    EntityDescriptor::sensor("system_time", "System Time", "status.system.time")
        .convert(Conversion::Timestamp)
        .diagnostic(),
    EntityDescriptor::sensor("uptime", "Uptime", "status.system.uptime")
        .unit(Unit::Second)
        .convert(Conversion::Uptime)
        .diagnostic(),
    EntityDescriptor::sensor("hw_version", "HW Version", "status.system.hw")
        .convert(Conversion::Text)
        .diagnostic(),
    EntityDescriptor::sensor("serial_number", "Serial Number", "status.system.sn")
        .convert(Conversion::Text)
        .diagnostic(),
    EntityDescriptor::sensor("mac", "MAC Address", "status.system.mac")
        .convert(Conversion::Mac)
        .diagnostic(),
    EntityDescriptor::sensor("fw_version", "FW Version", "status.system.fw")
        .convert(Conversion::Text)
        .diagnostic(),
    EntityDescriptor::sensor("web_ui", "Web UI", "status.system.www")
        .convert(Conversion::Text)
        .diagnostic(),
    EntityDescriptor::sensor("cloud_status", "Cloud Status", "status.cloud.status").diagnostic(),
    EntityDescriptor::sensor("cloud_reachable", "Cloud Reachable", "status.cloud.reachable")
        .convert(Conversion::Enum(labels::YES_NO))
        .diagnostic(),
    EntityDescriptor::sensor("cloud_registered", "Cloud Registered", "status.cloud.registered")
        .convert(Conversion::Enum(labels::YES_NO))
        .diagnostic(),
    // Controls
    EntityDescriptor::switch(
        "boost",
        "Master Boost",
        "status.system.masterBoost",
        WritePath::MasterBoost,
    ),
    EntityDescriptor::number(
        "target_power",
        "Target Power",
        "settings.regulation.target_power_w",
        WritePath::MasterSetting("regulation.target_power_w"),
        TARGET_POWER,
    )
    .unit(Unit::Watt),
];
