// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator event types.

use serde::Serialize;

use crate::coordinator::PollOutcome;
use crate::types::{DeviceId, DeviceIdentity};

/// Events emitted by the polling coordinator.
///
/// Events are published after the state they describe has been published,
/// so a subscriber reading the coordinator state on receipt sees the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// A device was listed by the master for the first time.
    DeviceAdded {
        /// Identity of the new device.
        identity: DeviceIdentity,
    },

    /// A device was dropped after its grace period.
    DeviceRemoved {
        /// Id of the removed device.
        device_id: DeviceId,
    },

    /// The integration as a whole became available or unavailable.
    AvailabilityChanged {
        /// New availability.
        available: bool,
    },

    /// One device became available or unavailable.
    DeviceAvailabilityChanged {
        /// Id of the device.
        device_id: DeviceId,
        /// New availability.
        available: bool,
        /// Error that made the device unavailable.
        error: Option<String>,
    },

    /// A refresh cycle finished.
    Refreshed {
        /// Cycle number, starting at 1.
        cycle: u64,
        /// Outcome of the cycle.
        outcome: PollOutcome,
    },
}

impl CoordinatorEvent {
    /// Returns the device id this event is about, if any.
    #[must_use]
    pub fn device_id(&self) -> Option<&DeviceId> {
        match self {
            Self::DeviceAdded { identity } => Some(&identity.device_id),
            Self::DeviceRemoved { device_id }
            | Self::DeviceAvailabilityChanged { device_id, .. } => Some(device_id),
            Self::AvailabilityChanged { .. } | Self::Refreshed { .. } => None,
        }
    }

    /// Returns `true` if this is a device lifecycle event (added/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::DeviceAdded { .. } | Self::DeviceRemoved { .. })
    }

    /// Returns `true` if this is an availability event.
    #[must_use]
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            Self::AvailabilityChanged { .. } | Self::DeviceAvailabilityChanged { .. }
        )
    }
}
