// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity descriptors: one row of the registry.

use serde::Serialize;

use crate::error::ValueError;
use crate::snapshot::DeviceSnapshot;
use crate::types::{CommandValue, Unit};

/// Kind of host-platform entity a descriptor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Read-only measurement or status.
    Sensor,
    /// Binary control.
    Switch,
    /// Numeric control.
    Number,
}

/// Presentation category of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Shown with the device's main controls and readings.
    #[default]
    Primary,
    /// Diagnostic detail (firmware, signal, raw codes).
    Diagnostic,
}

/// Where a field is read from in the raw device payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadPath {
    /// A single dot-separated path.
    ///
    /// Numeric segments index lists; a `key=value` segment selects the first
    /// list element whose `key` equals `value`.
    Path(&'static str),
    /// Sum of several numeric paths; missing if any component is missing.
    Sum(&'static [&'static str]),
}

/// How a raw JSON value becomes a [`FieldValue`](crate::types::FieldValue).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// Plain number.
    Number,
    /// Number multiplied by a factor and rounded to three decimals.
    Scale(f64),
    /// `0`/`1`, booleans or on/off style strings.
    Bool,
    /// Integer code mapped through a label table.
    Enum(&'static [&'static str]),
    /// Free text.
    Text,
    /// MAC address, normalized to `AA:BB:CC:DD:EE:FF`.
    Mac,
    /// Unix timestamp in seconds or milliseconds.
    Timestamp,
    /// Uptime in seconds or milliseconds, reported in seconds.
    Uptime,
}

/// Inclusive numeric bounds with a step, counted from `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberBounds {
    /// Lowest accepted value.
    pub min: f64,
    /// Highest accepted value.
    pub max: f64,
    /// Step between accepted values.
    pub step: f64,
}

impl NumberBounds {
    const STEP_TOLERANCE: f64 = 1e-6;

    /// Creates bounds.
    #[must_use]
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Returns a copy whose maximum does not exceed `limit`.
    #[must_use]
    pub fn capped(self, limit: f64) -> Self {
        Self {
            max: self.max.min(limit),
            ..self
        }
    }

    /// Checks a value against the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if the value is not finite, out of range, or
    /// not aligned to the step.
    pub fn check(&self, value: f64) -> Result<(), ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotFinite(value));
        }
        if value < self.min || value > self.max {
            return Err(ValueError::OutOfRange {
                min: self.min,
                max: self.max,
                actual: value,
            });
        }
        if self.step > 0.0 {
            let steps = (value - self.min) / self.step;
            if (steps - steps.round()).abs() > Self::STEP_TOLERANCE {
                return Err(ValueError::Misaligned {
                    min: self.min,
                    step: self.step,
                    actual: value,
                });
            }
        }
        Ok(())
    }
}

/// Validation applied to a command value before it is sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validation {
    /// Only boolean values are accepted.
    Switch,
    /// Numeric values within the bounds.
    Range(NumberBounds),
}

impl Validation {
    /// Checks a command value.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if the value has the wrong kind or fails the
    /// numeric bounds.
    pub fn check(&self, value: CommandValue) -> Result<(), ValueError> {
        match (self, value) {
            (Self::Switch, CommandValue::Bool(_)) => Ok(()),
            (Self::Switch, CommandValue::Number(_)) => {
                Err(ValueError::WrongKind { expected: "boolean" })
            }
            (Self::Range(bounds), CommandValue::Number(v)) => bounds.check(v),
            (Self::Range(_), CommandValue::Bool(_)) => {
                Err(ValueError::WrongKind { expected: "numeric" })
            }
        }
    }
}

/// Maximum that depends on the device's current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DynamicLimit {
    /// Maximum looked up from the installed circuit breaker rating.
    CircuitBreaker {
        /// Snapshot field holding the breaker rating in amperes.
        field: &'static str,
        /// `(amperes, maximum)` pairs.
        limits: &'static [(i64, f64)],
        /// Maximum used when the rating is unknown or not in the table.
        fallback: f64,
    },
}

impl DynamicLimit {
    /// Resolves the limit against a snapshot.
    #[must_use]
    pub fn resolve(&self, snapshot: Option<&DeviceSnapshot>) -> f64 {
        match self {
            Self::CircuitBreaker {
                field,
                limits,
                fallback,
            } => {
                // Breaker ratings are small whole numbers of amperes.
                #[allow(clippy::cast_possible_truncation)]
                let rating = snapshot
                    .and_then(|s| s.get(field))
                    .and_then(crate::types::FieldValue::as_f64)
                    .map(|a| a.round() as i64);
                rating
                    .and_then(|a| limits.iter().find(|(amps, _)| *amps == a))
                    .map_or(*fallback, |(_, max)| *max)
            }
        }
    }
}

/// How a write reaches the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePath {
    /// Master boost endpoint.
    MasterBoost,
    /// Device boost endpoint.
    DeviceBoost,
    /// Path inside the master settings document.
    MasterSetting(&'static str),
    /// Paths inside the device payload posted back as device settings.
    ///
    /// A `*` segment applies to every list element; a `key=value` segment
    /// selects (or creates) the matching list element.
    DeviceSetting(&'static [&'static str]),
}

/// Write capability of a descriptor.
///
/// Holding the validation next to the path keeps every writable field
/// checkable before dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Writable {
    /// Where the value is written.
    pub path: WritePath,
    /// Static validation.
    pub validation: Validation,
    /// Optional state dependent maximum.
    pub limit: Option<DynamicLimit>,
}

impl Writable {
    /// Validation with the dynamic limit applied against a snapshot.
    #[must_use]
    pub fn effective_validation(&self, snapshot: Option<&DeviceSnapshot>) -> Validation {
        match (self.validation, self.limit) {
            (Validation::Range(bounds), Some(limit)) => {
                Validation::Range(bounds.capped(limit.resolve(snapshot)))
            }
            (validation, _) => validation,
        }
    }
}

/// Declarative description of one entity of a device type.
///
/// Descriptors are built in `const` context:
///
/// ```
/// use azrouter_lib::registry::{Conversion, EntityDescriptor, EntityKind};
/// use azrouter_lib::types::Unit;
///
/// const GRID_VOLTAGE: EntityDescriptor =
///     EntityDescriptor::sensor("grid_voltage_l1", "Grid Voltage L1", "power.input.voltage.0.value")
///         .unit(Unit::Volt)
///         .convert(Conversion::Scale(0.001))
///         .diagnostic();
///
/// assert_eq!(GRID_VOLTAGE.kind, EntityKind::Sensor);
/// assert!(GRID_VOLTAGE.write.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityDescriptor {
    /// Stable field name; part of the entity unique id.
    pub field: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Entity kind.
    pub kind: EntityKind,
    /// Unit of measurement.
    pub unit: Option<Unit>,
    /// Where the value is read from.
    pub read: ReadPath,
    /// How the raw value is converted.
    pub conversion: Conversion,
    /// Presentation category.
    pub category: EntityCategory,
    /// Write capability.
    pub write: Option<Writable>,
}

impl EntityDescriptor {
    const fn base(field: &'static str, name: &'static str, kind: EntityKind, read: ReadPath) -> Self {
        Self {
            field,
            name,
            kind,
            unit: None,
            read,
            conversion: Conversion::Number,
            category: EntityCategory::Primary,
            write: None,
        }
    }

    /// Read-only sensor with a numeric conversion.
    #[must_use]
    pub const fn sensor(field: &'static str, name: &'static str, path: &'static str) -> Self {
        Self::base(field, name, EntityKind::Sensor, ReadPath::Path(path))
    }

    /// Read-only sensor summing several numeric paths.
    #[must_use]
    pub const fn sum(field: &'static str, name: &'static str, paths: &'static [&'static str]) -> Self {
        Self::base(field, name, EntityKind::Sensor, ReadPath::Sum(paths))
    }

    /// Boolean switch written through `write`.
    #[must_use]
    pub const fn switch(
        field: &'static str,
        name: &'static str,
        path: &'static str,
        write: WritePath,
    ) -> Self {
        let mut descriptor = Self::base(field, name, EntityKind::Switch, ReadPath::Path(path));
        descriptor.conversion = Conversion::Bool;
        descriptor.write = Some(Writable {
            path: write,
            validation: Validation::Switch,
            limit: None,
        });
        descriptor
    }

    /// Numeric control written through `write` within `bounds`.
    #[must_use]
    pub const fn number(
        field: &'static str,
        name: &'static str,
        path: &'static str,
        write: WritePath,
        bounds: NumberBounds,
    ) -> Self {
        let mut descriptor = Self::base(field, name, EntityKind::Number, ReadPath::Path(path));
        descriptor.write = Some(Writable {
            path: write,
            validation: Validation::Range(bounds),
            limit: None,
        });
        descriptor
    }

    /// Sets the unit.
    #[must_use]
    pub const fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the conversion.
    #[must_use]
    pub const fn convert(mut self, conversion: Conversion) -> Self {
        self.conversion = conversion;
        self
    }

    /// Marks the entity as diagnostic.
    #[must_use]
    pub const fn diagnostic(mut self) -> Self {
        self.category = EntityCategory::Diagnostic;
        self
    }

    /// Adds a state dependent maximum to a writable descriptor.
    #[must_use]
    pub const fn limited_by(mut self, limit: DynamicLimit) -> Self {
        if let Some(write) = self.write.as_mut() {
            write.limit = Some(limit);
        }
        self
    }

    /// Returns `true` if the descriptor declares a write path.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.write.is_some()
    }
}
