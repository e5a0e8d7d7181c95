// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `azrouter_lib` - A Rust library to poll and control A-Z Router devices.
//!
//! An A-Z Router installation is one master unit with child devices (slave
//! routers, charger cubes) reachable through the master's HTTP API. This
//! library reads them on a fixed interval, normalizes the payloads into
//! typed snapshots and exposes them as entities a home-automation host can
//! display and control.
//!
//! # Layers
//!
//! - [`protocol`] - the [`RouterApi`](protocol::RouterApi) seam and its HTTP
//!   client (login, session renewal, reads and writes)
//! - [`normalize`] - raw JSON to [`DeviceSnapshot`](snapshot::DeviceSnapshot)
//! - [`registry`] - per device type table of entity descriptors
//! - [`coordinator`] - polling cycle, failure isolation, published state
//! - [`command`] - validated boost and setpoint writes
//! - [`entity`] - unique ids, device info and entity values for the host
//! - [`integration`] - setup probe and unload of one installation
//!
//! # Quick Start
//!
//! ```no_run
//! use azrouter_lib::integration::{Integration, RouterConfig};
//! use azrouter_lib::subscription::Subscribable;
//! use azrouter_lib::types::Target;
//!
//! #[tokio::main]
//! async fn main() -> azrouter_lib::Result<()> {
//!     let config = RouterConfig::new("192.168.1.50", "admin", "secret");
//!     let integration = Integration::connect(&config).await?;
//!
//!     integration.coordinator().on_availability_changed(|available| {
//!         println!("router available: {available}");
//!     });
//!
//!     integration
//!         .set_target(&Target::Master, "target_power", 100.0)
//!         .await?;
//!
//!     for target in integration.dispatcher().targets() {
//!         println!("{} ({})", target.display_name, target.device_type);
//!     }
//!
//!     integration.unload().await;
//!     Ok(())
//! }
//! ```
//!
//! # Custom transports
//!
//! Anything implementing [`RouterApi`](protocol::RouterApi) can drive a
//! [`Coordinator`]; disable the default `http` feature to build without
//! `reqwest`.

pub mod command;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod event;
pub mod integration;
pub mod normalize;
pub mod protocol;
pub mod registry;
pub mod snapshot;
pub mod subscription;
pub mod types;

pub use command::CommandDispatcher;
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorState, PollOutcome};
pub use entity::{DeviceInfo, Entity, EntityState};
pub use error::{ApiError, ConfigError, Error, ParseError, Result, ValueError};
pub use event::{CoordinatorEvent, EventBus};
pub use integration::{Integration, RouterConfig};
#[cfg(feature = "http")]
pub use protocol::{HttpClient, HttpConfig};
pub use protocol::{RouterApi, RouterCommand};
pub use registry::Registry;
pub use snapshot::{DeviceSnapshot, MasterSnapshot};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::{
    CommandValue, DeviceId, DeviceIdentity, DeviceType, FieldValue, InstallationId, Target, Unit,
};
