// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity mapping registry.
//!
//! The registry is a static table from device type to an ordered list of
//! [`EntityDescriptor`]s. The normalizer reads fields through it, the entity
//! layer renders them and the command dispatcher looks up write paths and
//! validation bounds in it.
//!
//! # Examples
//!
//! ```
//! use azrouter_lib::registry::{EntityKind, Registry};
//! use azrouter_lib::types::DeviceType;
//!
//! let registry = Registry::builtin();
//! let boost = registry.lookup(&DeviceType::Slave, "boost").unwrap();
//! assert_eq!(boost.kind, EntityKind::Switch);
//!
//! // Types without a dedicated table only get the common fields.
//! let inverter = DeviceType::Unknown("5".to_string());
//! assert!(registry.lookup(&inverter, "boost").is_none());
//! assert!(registry.lookup(&inverter, "name").is_some());
//! ```

mod charger;
mod common;
mod descriptor;
pub mod labels;
mod master;
mod slave;

use std::collections::HashMap;

pub use charger::{BREAKER_LIMITS, MANUAL_POWER};
pub use descriptor::{
    Conversion, DynamicLimit, EntityCategory, EntityDescriptor, EntityKind, NumberBounds,
    ReadPath, Validation, Writable, WritePath,
};
pub use master::TARGET_POWER;
pub use slave::{MAX_POWER, TEMPERATURE};

use crate::types::DeviceType;

/// Read-only table of entity descriptors per device type.
#[derive(Debug, Clone)]
pub struct Registry {
    tables: HashMap<DeviceType, Vec<EntityDescriptor>>,
    generic: Vec<EntityDescriptor>,
}

impl Registry {
    /// Creates a registry with only the generic table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
            generic: common::COMMON.to_vec(),
        }
    }

    /// Creates the registry with the built-in master, slave and charger tables.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with_table(DeviceType::Master, master::MASTER)
            .with_table(DeviceType::Slave, &[common::COMMON, slave::SLAVE].concat())
            .with_table(
                DeviceType::ChargerCube,
                &[common::COMMON, charger::CHARGER].concat(),
            )
    }

    /// Adds or replaces the table for a device type.
    ///
    /// Descriptors keep the given order. A later descriptor with the same
    /// field name as an earlier one replaces it in place.
    #[must_use]
    pub fn with_table(mut self, device_type: DeviceType, descriptors: &[EntityDescriptor]) -> Self {
        let mut table: Vec<EntityDescriptor> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            match table.iter_mut().find(|d| d.field == descriptor.field) {
                Some(existing) => *existing = *descriptor,
                None => table.push(*descriptor),
            }
        }
        self.tables.insert(device_type, table);
        self
    }

    /// Returns the ordered descriptors for a device type.
    ///
    /// Device types without a table get the generic table.
    #[must_use]
    pub fn entries_for(&self, device_type: &DeviceType) -> &[EntityDescriptor] {
        self.tables
            .get(device_type)
            .map_or(self.generic.as_slice(), Vec::as_slice)
    }

    /// Looks up the descriptor of one field.
    #[must_use]
    pub fn lookup(&self, device_type: &DeviceType, field: &str) -> Option<&EntityDescriptor> {
        self.entries_for(device_type)
            .iter()
            .find(|d| d.field == field)
    }

    /// Returns `true` if the device type has a dedicated table.
    #[must_use]
    pub fn has_table(&self, device_type: &DeviceType) -> bool {
        self.tables.contains_key(device_type)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
