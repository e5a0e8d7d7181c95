// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Router REST endpoints.

/// Login, returns the bearer token.
pub const LOGIN: &str = "/api/v1/login";
/// Grid and load measurements.
pub const POWER: &str = "/api/v1/power";
/// System and cloud status.
pub const STATUS: &str = "/api/v1/status";
/// Child device list.
pub const DEVICES: &str = "/api/v1/devices";
/// Master settings (read and write).
pub const SETTINGS: &str = "/api/v1/settings";
/// Master boost.
pub const MASTER_BOOST: &str = "/api/v1/system/boost";
/// Child device boost.
pub const DEVICE_BOOST: &str = "/api/v1/device/boost";
/// Child device settings.
pub const DEVICE_SETTINGS: &str = "/api/v1/device/settings";
