// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the crate.
//!
//! # Types
//!
//! - [`DeviceId`] - Stable identifier of a unit within one installation
//! - [`InstallationId`] - Identifier of one configured installation
//! - [`DeviceType`] - Master, slave, charger cube or an unknown type code
//! - [`DeviceIdentity`] - Id, type and display name of a unit
//! - [`Target`] - Command target: the master or one device
//! - [`FieldValue`] - Normalized value of one field
//! - [`CommandValue`] - Value carried by a write command
//! - [`Unit`] - Unit of measurement attached to a field

mod device_id;
mod device_type;
mod target;
mod unit;
mod value;

pub use device_id::{DeviceId, InstallationId};
pub use device_type::{DeviceIdentity, DeviceType};
pub use target::Target;
pub use unit::Unit;
pub use value::{CommandValue, FieldValue};
