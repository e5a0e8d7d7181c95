// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory router shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use azrouter_lib::ApiError;
use azrouter_lib::normalize::path;
use azrouter_lib::protocol::{Ack, MasterPayload, RouterApi, RouterCommand};
use azrouter_lib::registry::WritePath;
use azrouter_lib::types::{DeviceId, Target};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Notify;

pub fn slave(id: u64, name: &str) -> Value {
    json!({
        "deviceType": 1,
        "common": {"id": id, "name": name, "status": 1},
        "power": {"output": [300, 0, 0], "totalPower": 300, "boost": 0, "temperature": 48},
        "settings": [{"power": {"targetTemperature": 60, "max": 2000}}]
    })
}

pub fn charger(id: u64, name: &str, breaker: u32) -> Value {
    json!({
        "deviceType": 4,
        "common": {"id": id, "name": name, "status": 1},
        "charge": {"status": 1, "circuitBreaker": breaker, "boost": 0},
        "settings": [{"charge": {"mode": [{"id": 1, "enabled": 1, "power": 2300}]}}]
    })
}

#[derive(Debug)]
struct Script {
    power: Value,
    status: Value,
    settings: Value,
    devices: Vec<Value>,
    master_error: Option<ApiError>,
    device_errors: HashMap<DeviceId, ApiError>,
    reject: bool,
    gate: Option<Arc<Notify>>,
}

/// A router whose answers are set by the test.
#[derive(Debug)]
pub struct MockRouter {
    script: Mutex<Script>,
    commands: Mutex<Vec<RouterCommand>>,
    master_calls: AtomicUsize,
    device_calls: AtomicUsize,
}

impl MockRouter {
    /// A master with two slaves, ids 1 and 2.
    pub fn new() -> Arc<Self> {
        Self::with_devices(vec![slave(1, "Boiler"), slave(2, "Tank")])
    }

    pub fn with_devices(devices: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script {
                power: json!({"input": {"power": [{"value": 100}, {"value": 50}, {"value": -20}]}}),
                status: json!({"system": {"status": 1, "masterBoost": 0}}),
                settings: json!({"regulation": {"target_power_w": 0}}),
                devices,
                master_error: None,
                device_errors: HashMap::new(),
                reject: false,
                gate: None,
            }),
            commands: Mutex::new(Vec::new()),
            master_calls: AtomicUsize::new(0),
            device_calls: AtomicUsize::new(0),
        })
    }

    pub fn fail_master(&self, error: Option<ApiError>) {
        self.script.lock().master_error = error;
    }

    pub fn fail_device(&self, id: &str, error: Option<ApiError>) {
        let mut script = self.script.lock();
        match error {
            Some(error) => script.device_errors.insert(DeviceId::new(id), error),
            None => script.device_errors.remove(&DeviceId::new(id)),
        };
    }

    /// Stops listing a device; direct reads answer `NotFound`.
    pub fn unplug(&self, id: &str) {
        self.script
            .lock()
            .devices
            .retain(|d| DeviceId::from_json(&d["common"]["id"]) != Some(DeviceId::new(id)));
    }

    pub fn plug(&self, device: Value) {
        self.script.lock().devices.push(device);
    }

    pub fn reject_commands(&self, reject: bool) {
        self.script.lock().reject = reject;
    }

    /// Makes the next master read wait until the returned handle is notified.
    pub fn hold_next_master_read(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script.lock().gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn master_calls(&self) -> usize {
        self.master_calls.load(Ordering::SeqCst)
    }

    pub fn device_calls(&self) -> usize {
        self.device_calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<RouterCommand> {
        self.commands.lock().clone()
    }

    fn find(devices: &[Value], id: &DeviceId) -> Option<usize> {
        devices
            .iter()
            .position(|d| DeviceId::from_json(&d["common"]["id"]).as_ref() == Some(id))
    }
}

impl RouterApi for MockRouter {
    async fn fetch_master(&self) -> Result<MasterPayload, ApiError> {
        self.master_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.script.lock().gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let script = self.script.lock();
        if let Some(error) = &script.master_error {
            return Err(error.clone());
        }
        Ok(MasterPayload {
            power: script.power.clone(),
            status: script.status.clone(),
            devices: script.devices.clone(),
            settings: script.settings.clone(),
        })
    }

    async fn fetch_device(&self, id: &DeviceId) -> Result<Value, ApiError> {
        self.device_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock();
        if let Some(error) = script.device_errors.get(id) {
            return Err(error.clone());
        }
        let index =
            Self::find(&script.devices, id).ok_or_else(|| ApiError::NotFound(id.clone()))?;
        Ok(script.devices[index].clone())
    }

    async fn send_command(&self, command: &RouterCommand) -> Result<Ack, ApiError> {
        self.commands.lock().push(command.clone());
        let mut script = self.script.lock();
        if script.reject {
            return Err(ApiError::Rejected {
                status: 409,
                message: "refused".to_string(),
            });
        }

        let value = command.value.to_wire();
        match (&command.target, command.write) {
            (Target::Master, WritePath::MasterBoost) => {
                script.status["system"]["masterBoost"] = value;
            }
            (Target::Master, WritePath::MasterSetting(setting)) => {
                path::patch(&mut script.settings, setting, &value)?;
            }
            (Target::Device(id), write) => {
                let index = Self::find(&script.devices, id)
                    .ok_or_else(|| ApiError::NotFound(id.clone()))?;
                let device = &mut script.devices[index];
                match write {
                    WritePath::DeviceBoost => {
                        let section = if device.get("charge").is_some() {
                            "charge"
                        } else {
                            "power"
                        };
                        device[section]["boost"] = value;
                    }
                    WritePath::DeviceSetting(settings) => {
                        for setting in settings {
                            path::patch(device, setting, &value)?;
                        }
                    }
                    WritePath::MasterBoost | WritePath::MasterSetting(_) => {
                        return Err(ApiError::Malformed("master write sent to a device".into()));
                    }
                }
            }
            (Target::Master, write) => {
                return Err(ApiError::Malformed(format!("{write:?} sent to the master")));
            }
        }

        Ok(Ack {
            target: command.target.clone(),
            body: json!({"ok": true}),
        })
    }
}
