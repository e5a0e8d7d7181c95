// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle of one router installation.
//!
//! [`Integration::setup`] probes the master once, runs the first refresh and
//! starts the periodic loop. If the probe fails the coordinator is shut down
//! and dropped together with its client, and the error is returned so the
//! host can report it. [`Integration::unload`] stops polling and releases
//! the client.
//!
//! # Examples
//!
//! ```no_run
//! use azrouter_lib::integration::{Integration, RouterConfig};
//! use azrouter_lib::types::Target;
//!
//! # async fn example() -> azrouter_lib::Result<()> {
//! let config = RouterConfig::new("192.168.1.50", "admin", "secret");
//! let integration = Integration::connect(&config).await?;
//!
//! for entity in integration.entities() {
//!     println!("{} = {:?}", entity.unique_id, entity.state(&integration.state()));
//! }
//!
//! integration.set_boost(&Target::Master, true).await?;
//! integration.unload().await;
//! # Ok(())
//! # }
//! ```

mod config;

use std::sync::Arc;

pub use config::RouterConfig;

use crate::command::CommandDispatcher;
use crate::coordinator::{Coordinator, CoordinatorState};
use crate::entity::{self, Entity};
use crate::error::Result;
use crate::protocol::{Ack, RouterApi};
#[cfg(feature = "http")]
use crate::protocol::HttpClient;
use crate::types::{CommandValue, Target};

/// A running installation: coordinator, dispatcher and entity surface.
#[derive(Debug)]
pub struct Integration<A> {
    coordinator: Coordinator<A>,
    dispatcher: CommandDispatcher<A>,
}

#[cfg(feature = "http")]
impl Integration<HttpClient> {
    /// Validates the configuration, connects over HTTP and sets up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for an invalid
    /// configuration, otherwise the errors of [`setup`](Self::setup).
    pub async fn connect(config: &RouterConfig) -> Result<Self> {
        config.validate()?;
        let client = config.http_config().into_client()?;
        let coordinator = Coordinator::builder(client)
            .config(config.coordinator_config())
            .build();
        Self::setup(coordinator).await
    }
}

impl<A: RouterApi + 'static> Integration<A> {
    /// Probes the master, runs the first refresh and starts polling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`](crate::Error::Api) if the master cannot be
    /// read, typically [`ApiError::Auth`](crate::ApiError::Auth) or
    /// [`ApiError::Unreachable`](crate::ApiError::Unreachable). The
    /// coordinator is shut down before returning.
    pub async fn setup(coordinator: Coordinator<A>) -> Result<Self> {
        coordinator.config().validate()?;

        if let Err(e) = coordinator.api().fetch_master().await {
            tracing::error!(
                installation = %coordinator.installation(),
                error = %e,
                "Router setup failed"
            );
            coordinator.shutdown().await;
            return Err(e.into());
        }

        if let Err(e) = coordinator.refresh().await {
            coordinator.shutdown().await;
            return Err(e);
        }
        coordinator.start();

        let state = coordinator.state();
        tracing::info!(
            installation = %coordinator.installation(),
            devices = state.devices.len(),
            "Router set up"
        );

        Ok(Self {
            dispatcher: CommandDispatcher::new(coordinator.clone()),
            coordinator,
        })
    }
}

impl<A: RouterApi> Integration<A> {
    /// Returns the coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &Coordinator<A> {
        &self.coordinator
    }

    /// Returns the command dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &CommandDispatcher<A> {
        &self.dispatcher
    }

    /// Returns the latest published state.
    #[must_use]
    pub fn state(&self) -> Arc<CoordinatorState> {
        self.coordinator.state()
    }

    /// Returns every entity of every currently known target.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        entity::entities(
            self.coordinator.installation(),
            self.coordinator.registry(),
            &self.coordinator.state(),
        )
    }

    /// Sets a boost and refreshes so the state shows the result.
    ///
    /// # Errors
    ///
    /// See [`CommandDispatcher::set`].
    pub async fn set_boost(&self, target: &Target, on: bool) -> Result<Ack> {
        self.command(target, crate::command::BOOST_FIELD, CommandValue::Bool(on))
            .await
    }

    /// Writes a numeric control and refreshes so the state shows the result.
    ///
    /// # Errors
    ///
    /// See [`CommandDispatcher::set`].
    pub async fn set_target(&self, target: &Target, field: &str, value: f64) -> Result<Ack> {
        self.command(target, field, CommandValue::Number(value))
            .await
    }

    async fn command(&self, target: &Target, field: &str, value: CommandValue) -> Result<Ack> {
        let ack = self.dispatcher.set(target, field, value).await?;
        if let Err(e) = self.coordinator.refresh().await {
            tracing::debug!(error = %e, "Refresh after command skipped");
        }
        Ok(ack)
    }

    /// Stops polling and releases the client.
    pub async fn unload(self) {
        self.coordinator.shutdown().await;
        tracing::info!(installation = %self.coordinator.installation(), "Router unloaded");
    }
}
