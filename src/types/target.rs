// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command target selection.

use std::fmt;
use std::str::FromStr;

use super::{DeviceId, DeviceIdentity};

/// Target of a write command: the master unit or one child device.
///
/// # Examples
///
/// ```
/// use azrouter_lib::types::{DeviceId, Target};
///
/// let master: Target = "master".parse().unwrap();
/// assert_eq!(master, Target::Master);
///
/// let slave: Target = "24".parse().unwrap();
/// assert_eq!(slave, Target::Device(DeviceId::new("24")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The master unit.
    Master,
    /// A child device.
    Device(DeviceId),
}

impl Target {
    /// Returns the target id as used in unique ids and pickers.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Master => DeviceIdentity::MASTER_ID,
            Self::Device(id) => id.as_str(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Target {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(DeviceIdentity::MASTER_ID) {
            Ok(Self::Master)
        } else {
            Ok(Self::Device(DeviceId::new(s)))
        }
    }
}

impl From<DeviceId> for Target {
    fn from(id: DeviceId) -> Self {
        Self::Device(id)
    }
}
