// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for types exposing coordinator callbacks.

use crate::coordinator::CoordinatorState;
use crate::subscription::SubscriptionId;
use crate::types::DeviceId;

/// Types that accept listener callbacks.
///
/// # Examples
///
/// ```no_run
/// use azrouter_lib::subscription::Subscribable;
/// # fn example<S: Subscribable>(coordinator: &S) {
/// let id = coordinator.on_availability_changed(|available| {
///     println!("router available: {available}");
/// });
/// coordinator.unsubscribe(id);
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to the state published after every refresh cycle.
    fn on_update<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CoordinatorState) + Send + Sync + 'static;

    /// Subscribes to integration availability changes.
    fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Subscribes to per-device availability changes.
    fn on_device_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceId, bool) + Send + Sync + 'static;

    /// Unsubscribes a callback. Returns `true` if it was registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
