// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener callbacks.
//!
//! Besides the `watch` channel and the event bus, the coordinator accepts
//! plain callbacks for hosts that prefer them:
//!
//! - [`SubscriptionId`] - identifier used to unsubscribe
//! - [`CallbackRegistry`] - stores and dispatches callbacks
//! - [`Subscribable`] - trait implemented by the coordinator

mod callback;
mod subscribable;

pub use callback::{CallbackRegistry, SubscriptionId};
pub use subscribable::Subscribable;
