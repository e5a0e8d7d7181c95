// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling coordinator.
//!
//! One [`Coordinator`] per installation reads the master and every listed
//! child device on a fixed interval, normalizes the payloads and publishes
//! an immutable [`CoordinatorState`].
//!
//! Failures are isolated per device: a child that cannot be read only
//! becomes unavailable, while the integration as a whole becomes unavailable
//! after [`CoordinatorConfig::failure_threshold`] consecutive master
//! failures. Devices the master stops listing are dropped after
//! [`CoordinatorConfig::grace_cycles`] cycles.

mod config;
mod polling;
mod state;

pub use config::CoordinatorConfig;
pub use polling::{Coordinator, CoordinatorBuilder};
pub use state::{CoordinatorState, DeviceEntry, PollOutcome};
