// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Router API access.
//!
//! [`RouterApi`] is the seam between the coordinator and the network. The
//! crate ships [`HttpClient`] (feature `http`, enabled by default); tests and
//! alternative transports provide their own implementation.
//!
//! Implementations do not cache: every call reflects the router's state at
//! the time of the call.

pub mod endpoints;
#[cfg(feature = "http")]
mod http;

use std::future::Future;
use std::sync::Arc;

use serde_json::{Value, json};

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig};

use crate::error::{ApiError, ValueError};
use crate::registry::{Validation, WritePath};
use crate::types::{CommandValue, DeviceId, Target};

/// Raw master aggregate, one member per endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterPayload {
    /// `/power` response.
    pub power: Value,
    /// `/status` response.
    pub status: Value,
    /// Device list from `/devices`.
    pub devices: Vec<Value>,
    /// `/settings` response, `{}` when it could not be read.
    pub settings: Value,
}

impl MasterPayload {
    /// Composite document the master table's read paths are relative to.
    #[must_use]
    pub fn document(&self) -> Value {
        json!({
            "power": self.power,
            "status": self.status,
            "settings": self.settings,
        })
    }
}

/// A validated write request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterCommand {
    /// Unit the command is addressed to.
    pub target: Target,
    /// Field name the command writes, for logging.
    pub field: String,
    /// Where the value is written.
    pub write: WritePath,
    /// Value to write.
    pub value: CommandValue,
    /// Bounds the value must satisfy.
    pub validation: Validation,
}

impl RouterCommand {
    /// Checks the value against the command's bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if the value is not accepted.
    pub fn validate(&self) -> Result<(), ValueError> {
        self.validation.check(self.value)
    }
}

/// Acknowledgement of an accepted write.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    /// Unit the command was addressed to.
    pub target: Target,
    /// Response body, `Null` when empty or not JSON.
    pub body: Value,
}

/// Access to one router installation.
///
/// Methods return `Send` futures so that a coordinator can drive them from
/// a spawned task.
pub trait RouterApi: Send + Sync {
    /// Fetches the master aggregate.
    ///
    /// # Errors
    ///
    /// [`ApiError::Auth`], [`ApiError::Unreachable`] or [`ApiError::Malformed`].
    fn fetch_master(&self) -> impl Future<Output = Result<MasterPayload, ApiError>> + Send;

    /// Fetches the raw payload of one child device.
    ///
    /// # Errors
    ///
    /// As [`fetch_master`](Self::fetch_master), plus [`ApiError::NotFound`]
    /// when the master no longer lists the device.
    fn fetch_device(&self, id: &DeviceId)
    -> impl Future<Output = Result<Value, ApiError>> + Send;

    /// Sends a write command.
    ///
    /// Implementations re-validate the value before sending.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`], [`ApiError::Unreachable`],
    /// [`ApiError::Rejected`] or [`ApiError::Auth`].
    fn send_command(&self, command: &RouterCommand)
    -> impl Future<Output = Result<Ack, ApiError>> + Send;
}

impl<T: RouterApi> RouterApi for Arc<T> {
    fn fetch_master(&self) -> impl Future<Output = Result<MasterPayload, ApiError>> + Send {
        (**self).fetch_master()
    }

    fn fetch_device(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send {
        (**self).fetch_device(id)
    }

    fn send_command(
        &self,
        command: &RouterCommand,
    ) -> impl Future<Output = Result<Ack, ApiError>> + Send {
        (**self).send_command(command)
    }
}
