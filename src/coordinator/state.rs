// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Published coordinator state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::snapshot::{DeviceSnapshot, MasterSnapshot};
use crate::types::{DeviceId, DeviceIdentity, Target};

/// Result of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// The master and every listed device were read.
    Success,
    /// The master was read but at least one device failed.
    PartialFailure,
    /// The master could not be read; the previous snapshot is kept.
    TotalFailure,
}

impl PollOutcome {
    /// Returns `true` if the master was read.
    #[must_use]
    pub fn master_succeeded(self) -> bool {
        !matches!(self, Self::TotalFailure)
    }
}

/// One child device tracked by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEntry {
    /// Identity as last listed by the master.
    pub identity: DeviceIdentity,
    /// Latest snapshot; `None` until the first successful read.
    pub snapshot: Option<DeviceSnapshot>,
    /// Consecutive failed reads.
    pub failures: u32,
    /// Consecutive cycles the device was not listed or not found.
    pub missing_cycles: u32,
    /// Error of the last failed read, cleared on success.
    pub last_error: Option<String>,
}

impl DeviceEntry {
    /// Creates an entry for a newly listed device.
    #[must_use]
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            snapshot: None,
            failures: 0,
            missing_cycles: 0,
            last_error: None,
        }
    }

    /// Returns `true` if the last read of this device succeeded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.available)
    }
}

/// State of one installation, replaced as a whole after every cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinatorState {
    /// Latest master snapshot.
    pub master: Option<MasterSnapshot>,
    /// Known child devices, in master order.
    pub devices: Vec<DeviceEntry>,
    /// Time of the last cycle in which the master was read.
    pub last_success: Option<DateTime<Utc>>,
    /// Outcome of the last cycle.
    pub last_outcome: Option<PollOutcome>,
    /// Consecutive failed master reads.
    pub master_failures: u32,
    /// Whether the integration as a whole is available.
    pub integration_available: bool,
    /// Number of completed cycles.
    pub cycle: u64,
}

impl CoordinatorState {
    /// Finds a device entry.
    #[must_use]
    pub fn device(&self, id: &DeviceId) -> Option<&DeviceEntry> {
        self.devices.iter().find(|e| &e.identity.device_id == id)
    }

    /// Returns a device's latest snapshot.
    #[must_use]
    pub fn snapshot(&self, id: &DeviceId) -> Option<&DeviceSnapshot> {
        self.device(id).and_then(|e| e.snapshot.as_ref())
    }

    /// Returns the master's own snapshot.
    #[must_use]
    pub fn master_snapshot(&self) -> Option<&DeviceSnapshot> {
        self.master.as_ref().map(|m| &m.snapshot)
    }

    /// Returns the snapshot of a command target.
    #[must_use]
    pub fn target_snapshot(&self, target: &Target) -> Option<&DeviceSnapshot> {
        match target {
            Target::Master => self.master_snapshot(),
            Target::Device(id) => self.snapshot(id),
        }
    }

    /// Resolves a command target to its identity, if currently known.
    #[must_use]
    pub fn identity(&self, target: &Target) -> Option<DeviceIdentity> {
        match target {
            Target::Master => self.master.as_ref().map(|_| DeviceIdentity::master()),
            Target::Device(id) => self.device(id).map(|e| e.identity.clone()),
        }
    }

    /// Identities of every currently known target, master first.
    #[must_use]
    pub fn known_targets(&self) -> Vec<DeviceIdentity> {
        self.master
            .as_ref()
            .map(|_| DeviceIdentity::master())
            .into_iter()
            .chain(self.devices.iter().map(|e| e.identity.clone()))
            .collect()
    }

    /// Returns `true` if the device is known and its last read succeeded.
    #[must_use]
    pub fn is_device_available(&self, id: &DeviceId) -> bool {
        self.integration_available && self.device(id).is_some_and(DeviceEntry::is_available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceType;

    fn state_with(entries: Vec<DeviceEntry>) -> CoordinatorState {
        CoordinatorState {
            master: Some(MasterSnapshot {
                snapshot: DeviceSnapshot::new(DeviceType::Master, Utc::now()),
                devices: Vec::new(),
                settings: serde_json::json!({}),
            }),
            devices: entries,
            integration_available: true,
            ..CoordinatorState::default()
        }
    }

    #[test]
    fn known_targets_start_with_master() {
        let boiler = DeviceIdentity::new(DeviceId::new("1"), DeviceType::Slave, "Boiler");
        let state = state_with(vec![DeviceEntry::new(boiler.clone())]);
        assert_eq!(state.known_targets(), vec![DeviceIdentity::master(), boiler]);
    }

    #[test]
    fn empty_state_knows_no_target() {
        let state = CoordinatorState::default();
        assert!(state.known_targets().is_empty());
        assert!(state.identity(&Target::Master).is_none());
    }

    #[test]
    fn entry_without_snapshot_is_unavailable() {
        let id = DeviceId::new("2");
        let mut entry = DeviceEntry::new(DeviceIdentity::new(id.clone(), DeviceType::ChargerCube, "Car"));
        let state = state_with(vec![entry.clone()]);
        assert!(!state.is_device_available(&id));

        entry.snapshot = Some(DeviceSnapshot::new(DeviceType::ChargerCube, Utc::now()));
        let state = state_with(vec![entry]);
        assert!(state.is_device_available(&id));
    }
}
