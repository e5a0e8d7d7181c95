// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for coordinator subscriptions.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::coordinator::CoordinatorState;
use crate::event::CoordinatorEvent;
use crate::types::DeviceId;

/// Unique identifier for a subscription.
///
/// Returned when registering a callback and used to unsubscribe later. IDs
/// are unique within one coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type UpdateCallback = Arc<dyn Fn(&CoordinatorState) + Send + Sync>;
type AvailabilityCallback = Arc<dyn Fn(bool) + Send + Sync>;
type DeviceAvailabilityCallback = Arc<dyn Fn(&DeviceId, bool) + Send + Sync>;

/// Registry of listener callbacks.
///
/// Callbacks run synchronously on the coordinator task, after the state
/// they observe has been published. They must not block.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    update_callbacks: RwLock<HashMap<SubscriptionId, UpdateCallback>>,
    availability_callbacks: RwLock<HashMap<SubscriptionId, AvailabilityCallback>>,
    device_availability_callbacks: RwLock<HashMap<SubscriptionId, DeviceAvailabilityCallback>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            update_callbacks: RwLock::new(HashMap::new()),
            availability_callbacks: RwLock::new(HashMap::new()),
            device_availability_callbacks: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback run after every refresh cycle.
    pub fn on_update<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CoordinatorState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.update_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback run when the integration's availability flips.
    pub fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.availability_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback run when one device's availability flips.
    pub fn on_device_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceId, bool) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.device_availability_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.update_callbacks.write().remove(&id).is_some()
            || self.availability_callbacks.write().remove(&id).is_some()
            || self
                .device_availability_callbacks
                .write()
                .remove(&id)
                .is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.update_callbacks.write().clear();
        self.availability_callbacks.write().clear();
        self.device_availability_callbacks.write().clear();
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.update_callbacks.read().len()
            + self.availability_callbacks.read().len()
            + self.device_availability_callbacks.read().len()
    }

    /// Returns `true` if no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Callbacks are cloned out of the lock before running so that a callback
    // may unsubscribe itself.

    /// Runs the update callbacks.
    pub fn dispatch_update(&self, state: &CoordinatorState) {
        let callbacks: Vec<_> = self.update_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback(state);
        }
    }

    /// Runs the callbacks matching an availability event; other events are
    /// ignored.
    pub fn dispatch_event(&self, event: &CoordinatorEvent) {
        match event {
            CoordinatorEvent::AvailabilityChanged { available } => {
                let callbacks: Vec<_> = self
                    .availability_callbacks
                    .read()
                    .values()
                    .cloned()
                    .collect();
                for callback in callbacks {
                    callback(*available);
                }
            }
            CoordinatorEvent::DeviceAvailabilityChanged {
                device_id,
                available,
                ..
            } => {
                let callbacks: Vec<_> = self
                    .device_availability_callbacks
                    .read()
                    .values()
                    .cloned()
                    .collect();
                for callback in callbacks {
                    callback(device_id, *available);
                }
            }
            CoordinatorEvent::DeviceAdded { .. }
            | CoordinatorEvent::DeviceRemoved { .. }
            | CoordinatorEvent::Refreshed { .. } => {}
        }
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("update_callbacks", &self.update_callbacks.read().len())
            .field(
                "availability_callbacks",
                &self.availability_callbacks.read().len(),
            )
            .field(
                "device_availability_callbacks",
                &self.device_availability_callbacks.read().len(),
            )
            .finish_non_exhaustive()
    }
}
