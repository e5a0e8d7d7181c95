// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator events.
//!
//! The coordinator publishes a [`CoordinatorEvent`] on its [`EventBus`] for
//! every change a host platform reacts to: devices appearing or being
//! removed, availability flips, and the end of each refresh cycle.
//!
//! # Examples
//!
//! ```
//! use azrouter_lib::event::{CoordinatorEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(CoordinatorEvent::AvailabilityChanged { available: false });
//! assert!(matches!(
//!     rx.try_recv(),
//!     Ok(CoordinatorEvent::AvailabilityChanged { available: false })
//! ));
//! ```

mod coordinator_event;
mod event_bus;

pub use coordinator_event::CoordinatorEvent;
pub use event_bus::EventBus;
