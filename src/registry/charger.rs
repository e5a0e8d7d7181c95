// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Charger cube (`deviceType` 4) table, on top of the common fields.

use super::descriptor::{Conversion, DynamicLimit, EntityDescriptor, NumberBounds, WritePath};
use super::labels;
use crate::types::Unit;

/// Bounds of the manual charging power before the breaker limit applies.
pub const MANUAL_POWER: NumberBounds = NumberBounds::new(1400.0, 7400.0, 100.0);

/// Maximum manual power per circuit breaker rating in amperes.
pub const BREAKER_LIMITS: &[(i64, f64)] = &[(10, 2300.0), (16, 3700.0), (24, 5500.0), (32, 7400.0)];

/// Charger specific fields.
pub const CHARGER: &[EntityDescriptor] = &[
    EntityDescriptor::sensor("charge_status", "Charge Status", "charge.status")
        .convert(Conversion::Enum(labels::CHARGE_STATUS)),
    EntityDescriptor::sensor("circuit_breaker", "Circuit Breaker", "charge.circuitBreaker")
        .unit(Unit::Ampere)
        .diagnostic(),
    EntityDescriptor::switch("boost", "Boost", "charge.boost", WritePath::DeviceBoost),
    EntityDescriptor::number(
        "manual_power",
        "Manual Charging Power",
        "settings.0.charge.mode.id=1.power",
        WritePath::DeviceSetting(&["settings.*.charge.mode.id=1.power"]),
        MANUAL_POWER,
    )
    .unit(Unit::Watt)
    .limited_by(DynamicLimit::CircuitBreaker {
        field: "circuit_breaker",
        limits: BREAKER_LIMITS,
        fallback: 7400.0,
    }),
];
