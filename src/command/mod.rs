// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command dispatch.
//!
//! The [`CommandDispatcher`] resolves a target against the coordinator's
//! current state, looks the field up in the entity registry and validates
//! the value before anything goes on the wire:
//!
//! | Failure | Error |
//! |---------|-------|
//! | Target not currently known | [`Error::UnknownTarget`] |
//! | Field has no write path on the target's type | [`Error::UnsupportedCommand`] |
//! | Value outside bounds, step or dynamic limit | [`Error::Value`] |
//! | Router refused the write | [`ApiError::Rejected`] |
//!
//! A successful command does not touch the published state; the written
//! value shows up after the next refresh.
//!
//! # Examples
//!
//! ```no_run
//! use azrouter_lib::command::CommandDispatcher;
//! use azrouter_lib::coordinator::Coordinator;
//! use azrouter_lib::protocol::HttpConfig;
//! use azrouter_lib::types::Target;
//!
//! # async fn example() -> azrouter_lib::Result<()> {
//! let client = HttpConfig::new("192.168.1.50")
//!     .with_credentials("admin", "secret")
//!     .into_client()?;
//! let coordinator = Coordinator::builder(client).build();
//! coordinator.refresh().await?;
//!
//! let dispatcher = CommandDispatcher::new(coordinator.clone());
//! dispatcher.set_target(&Target::Master, "target_power", 200.0).await?;
//! dispatcher.set_boost(&Target::Device("24".into()), true).await?;
//! coordinator.refresh().await?;
//! # Ok(())
//! # }
//! ```

use crate::coordinator::Coordinator;
use crate::error::{ApiError, Error, Result};
use crate::protocol::{Ack, RouterApi, RouterCommand};
use crate::types::{CommandValue, DeviceIdentity, Target};

/// Field name of the boost switch on every device type that has one.
pub const BOOST_FIELD: &str = "boost";

/// Validates and sends write commands for one installation.
#[derive(Debug, Clone)]
pub struct CommandDispatcher<A> {
    coordinator: Coordinator<A>,
}

impl<A: RouterApi> CommandDispatcher<A> {
    /// Creates a dispatcher sharing the coordinator's client and state.
    #[must_use]
    pub fn new(coordinator: Coordinator<A>) -> Self {
        Self { coordinator }
    }

    /// Returns the targets a command can currently be sent to, master first.
    #[must_use]
    pub fn targets(&self) -> Vec<DeviceIdentity> {
        self.coordinator.state().known_targets()
    }

    /// Turns the boost of a target on or off.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub async fn set_boost(&self, target: &Target, on: bool) -> Result<Ack> {
        self.set(target, BOOST_FIELD, CommandValue::Bool(on)).await
    }

    /// Writes a numeric control of a target.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub async fn set_target(&self, target: &Target, field: &str, value: f64) -> Result<Ack> {
        self.set(target, field, CommandValue::Number(value)).await
    }

    /// Validates a command against the current state and sends it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTarget`], [`Error::UnsupportedCommand`] or
    /// [`Error::Value`] without a network call, and [`Error::Api`] if the
    /// router cannot be reached or refuses the write.
    pub async fn set(&self, target: &Target, field: &str, value: CommandValue) -> Result<Ack> {
        let command = self.prepare(target, field, value)?;
        match self.coordinator.api().send_command(&command).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                if let ApiError::Rejected { status, .. } = &e {
                    tracing::warn!(device = %command.target, field, status, "Command rejected");
                }
                Err(e.into())
            }
        }
    }

    /// Builds the validated command for `(target, field, value)`.
    ///
    /// # Errors
    ///
    /// Same pre-dispatch errors as [`set`](Self::set).
    pub fn prepare(&self, target: &Target, field: &str, value: CommandValue) -> Result<RouterCommand> {
        let state = self.coordinator.state();
        let identity = state
            .identity(target)
            .ok_or_else(|| Error::UnknownTarget(target.to_string()))?;

        let writable = self
            .coordinator
            .registry()
            .lookup(&identity.device_type, field)
            .and_then(|d| d.write)
            .ok_or_else(|| Error::UnsupportedCommand {
                device_type: identity.device_type.clone(),
                field: field.to_string(),
            })?;

        let validation = writable.effective_validation(state.target_snapshot(target));
        validation.check(value)?;

        Ok(RouterCommand {
            target: target.clone(),
            field: field.to_string(),
            write: writable.path,
            value,
            validation,
        })
    }
}
