// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Units of measurement.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit of measurement attached to a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Watt.
    Watt,
    /// Kilowatt hour.
    KilowattHour,
    /// Volt.
    Volt,
    /// Ampere.
    Ampere,
    /// Degree Celsius.
    Celsius,
    /// Decibel (signal strength).
    Decibel,
    /// Second.
    Second,
}

impl Unit {
    /// Returns the unit symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Watt => "W",
            Self::KilowattHour => "kWh",
            Self::Volt => "V",
            Self::Ampere => "A",
            Self::Celsius => "°C",
            Self::Decibel => "dB",
            Self::Second => "s",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
