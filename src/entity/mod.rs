// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-facing entities.
//!
//! An [`Entity`] pairs one registry descriptor with one known target. Its
//! unique id is derived from the installation, the target and the field
//! only, so it survives restarts and renames:
//!
//! - master fields: `<installation>_master_<field>`
//! - child fields: `<installation>_device_<id>_<field>`

use serde::Serialize;

use crate::coordinator::CoordinatorState;
use crate::registry::{EntityCategory, EntityDescriptor, EntityKind, Registry};
use crate::snapshot::DeviceSnapshot;
use crate::types::{DeviceIdentity, FieldValue, InstallationId, Target, Unit};

/// Manufacturer reported for every device.
pub const MANUFACTURER: &str = "A-Z Traders";

/// Device information shared by every entity of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Device id (`master` for the master unit).
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Always [`MANUFACTURER`].
    pub manufacturer: &'static str,
    /// Model name derived from the device type.
    pub model: &'static str,
    /// Firmware version, if reported.
    pub sw_version: Option<String>,
    /// Parent device; set for children of the master.
    pub via_device: Option<String>,
}

impl DeviceInfo {
    /// Builds the device information of a target.
    #[must_use]
    pub fn new(identity: &DeviceIdentity, snapshot: Option<&DeviceSnapshot>) -> Self {
        let is_master = identity.device_type.is_master();
        Self {
            identifier: identity.device_id.to_string(),
            name: identity.display_name.clone(),
            manufacturer: MANUFACTURER,
            model: identity.device_type.model(),
            sw_version: snapshot
                .and_then(|s| s.get("fw_version"))
                .map(ToString::to_string),
            via_device: (!is_master).then(|| DeviceIdentity::MASTER_ID.to_string()),
        }
    }
}

/// One entity exposed to the host platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    /// Stable unique id.
    pub unique_id: String,
    /// Display name.
    pub name: &'static str,
    /// Entity kind.
    pub kind: EntityKind,
    /// Presentation category.
    pub category: EntityCategory,
    /// Unit of measurement.
    pub unit: Option<Unit>,
    /// Device the entity belongs to.
    pub device_info: DeviceInfo,
    /// Field read from the device snapshot.
    pub field: &'static str,
    /// Target the entity reads from and writes to.
    #[serde(serialize_with = "serialize_target")]
    pub target: Target,
}

/// Current value of an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    /// The device or the integration is unavailable, or the field was not
    /// reported in the last payload.
    Unavailable,
    /// Latest value.
    Value(FieldValue),
}

impl Entity {
    /// Builds the entity for one descriptor of one target.
    #[must_use]
    pub fn new(
        installation: InstallationId,
        identity: &DeviceIdentity,
        descriptor: &EntityDescriptor,
        snapshot: Option<&DeviceSnapshot>,
    ) -> Self {
        let target = if identity.device_type.is_master() {
            Target::Master
        } else {
            Target::Device(identity.device_id.clone())
        };
        Self {
            unique_id: unique_id(installation, &target, descriptor.field),
            name: descriptor.name,
            kind: descriptor.kind,
            category: descriptor.category,
            unit: descriptor.unit,
            device_info: DeviceInfo::new(identity, snapshot),
            field: descriptor.field,
            target,
        }
    }

    /// Returns `true` if the entity accepts commands.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        matches!(self.kind, EntityKind::Switch | EntityKind::Number)
    }

    /// Reads the entity's current value from a published state.
    ///
    /// A field the last payload did not carry is unavailable, never zero.
    #[must_use]
    pub fn state(&self, state: &CoordinatorState) -> EntityState {
        let available = match &self.target {
            Target::Master => state.integration_available,
            Target::Device(id) => state.is_device_available(id),
        };
        if !available {
            return EntityState::Unavailable;
        }
        state
            .target_snapshot(&self.target)
            .and_then(|s| s.get(self.field))
            .map_or(EntityState::Unavailable, |v| EntityState::Value(v.clone()))
    }
}

/// Builds the unique id of a field of a target.
#[must_use]
pub fn unique_id(installation: InstallationId, target: &Target, field: &str) -> String {
    match target {
        Target::Master => format!("{installation}_master_{field}"),
        Target::Device(id) => format!("{installation}_device_{id}_{field}"),
    }
}

/// Builds every entity of every currently known target, master first.
#[must_use]
pub fn entities(
    installation: InstallationId,
    registry: &Registry,
    state: &CoordinatorState,
) -> Vec<Entity> {
    state
        .known_targets()
        .iter()
        .flat_map(|identity| {
            let target = if identity.device_type.is_master() {
                Target::Master
            } else {
                Target::Device(identity.device_id.clone())
            };
            let snapshot = state.target_snapshot(&target);
            registry
                .entries_for(&identity.device_type)
                .iter()
                .map(move |descriptor| Entity::new(installation, identity, descriptor, snapshot))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn serialize_target<S: serde::Serializer>(target: &Target, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(target.id())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::coordinator::DeviceEntry;
    use crate::snapshot::MasterSnapshot;
    use crate::types::{DeviceId, DeviceType};
    use uuid::Uuid;

    fn installation() -> InstallationId {
        InstallationId::from_uuid(Uuid::nil())
    }

    fn state() -> CoordinatorState {
        let mut master = DeviceSnapshot::new(DeviceType::Master, Utc::now());
        master
            .fields
            .insert("fw_version".to_string(), FieldValue::Text("3.2".to_string()));
        master
            .fields
            .insert("grid_power_total".to_string(), FieldValue::Number(-120.0));

        let boiler = DeviceIdentity::new(DeviceId::new("1"), DeviceType::Slave, "Boiler");
        let mut entry = DeviceEntry::new(boiler);
        entry.snapshot = Some(DeviceSnapshot::new(DeviceType::Slave, Utc::now()));

        CoordinatorState {
            master: Some(MasterSnapshot {
                snapshot: master,
                devices: Vec::new(),
                settings: serde_json::json!({}),
            }),
            devices: vec![entry],
            integration_available: true,
            ..CoordinatorState::default()
        }
    }

    #[test]
    fn unique_ids_follow_target() {
        let nil = Uuid::nil();
        assert_eq!(
            unique_id(installation(), &Target::Master, "boost"),
            format!("{nil}_master_boost")
        );
        assert_eq!(
            unique_id(installation(), &Target::Device(DeviceId::new("7")), "boost"),
            format!("{nil}_device_7_boost")
        );
    }

    #[test]
    fn entities_cover_every_descriptor() {
        let registry = Registry::builtin();
        let state = state();
        let all = entities(installation(), &registry, &state);

        let expected = registry.entries_for(&DeviceType::Master).len()
            + registry.entries_for(&DeviceType::Slave).len();
        assert_eq!(all.len(), expected);

        let master_boost = all
            .iter()
            .find(|e| e.target == Target::Master && e.field == "boost")
            .unwrap();
        assert!(master_boost.is_writable());
        assert_eq!(master_boost.device_info.manufacturer, MANUFACTURER);
        assert_eq!(master_boost.device_info.sw_version.as_deref(), Some("3.2"));
        assert!(master_boost.device_info.via_device.is_none());

        let child = all.iter().find(|e| e.target != Target::Master).unwrap();
        assert_eq!(child.device_info.via_device.as_deref(), Some("master"));
        assert_eq!(child.device_info.model, DeviceType::Slave.model());
    }

    #[test]
    fn state_reflects_availability() {
        let registry = Registry::builtin();
        let mut state = state();
        let grid = Entity::new(
            installation(),
            &DeviceIdentity::master(),
            registry.lookup(&DeviceType::Master, "grid_power_total").unwrap(),
            None,
        );
        assert_eq!(grid.state(&state), EntityState::Value(FieldValue::Number(-120.0)));

        let mac = Entity::new(
            installation(),
            &DeviceIdentity::master(),
            registry.lookup(&DeviceType::Master, "mac").unwrap(),
            None,
        );
        assert_eq!(mac.state(&state), EntityState::Unavailable);

        state.integration_available = false;
        assert_eq!(grid.state(&state), EntityState::Unavailable);
    }

    #[test]
    fn missing_field_is_unavailable_on_available_device() {
        let registry = Registry::builtin();
        let mut state = state();
        let boiler = DeviceIdentity::new(DeviceId::new("1"), DeviceType::Slave, "Boiler");
        let power = Entity::new(
            installation(),
            &boiler,
            registry.lookup(&DeviceType::Slave, "power_total").unwrap(),
            None,
        );

        let snapshot = state.devices[0].snapshot.as_mut().unwrap();
        snapshot.available = true;
        snapshot.missing.insert("power_total".to_string());
        assert!(state.is_device_available(&DeviceId::new("1")));
        assert_eq!(power.state(&state), EntityState::Unavailable);

        let snapshot = state.devices[0].snapshot.as_mut().unwrap();
        snapshot.missing.clear();
        snapshot
            .fields
            .insert("power_total".to_string(), FieldValue::Number(0.0));
        assert_eq!(
            power.state(&state),
            EntityState::Value(FieldValue::Number(0.0))
        );
    }
}
