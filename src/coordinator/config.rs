// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Polling behaviour of a [`Coordinator`](super::Coordinator).
///
/// # Examples
///
/// ```
/// use azrouter_lib::coordinator::CoordinatorConfig;
/// use std::time::Duration;
///
/// let config = CoordinatorConfig::new()
///     .with_interval(Duration::from_secs(15))
///     .with_failure_threshold(5)
///     .with_grace_cycles(2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Time between two scheduled refresh cycles.
    pub interval: Duration,
    /// Consecutive master failures after which the integration is
    /// unavailable.
    pub failure_threshold: u32,
    /// Consecutive cycles a device may be absent before it is removed.
    pub grace_cycles: u32,
}

impl CoordinatorConfig {
    /// Default refresh interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
    /// Default master failure threshold.
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
    /// Default grace period in cycles.
    pub const DEFAULT_GRACE_CYCLES: u32 = 3;

    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the refresh interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the master failure threshold.
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the device grace period.
    #[must_use]
    pub fn with_grace_cycles(mut self, cycles: u32) -> Self {
        self.grace_cycles = cycles;
        self
    }

    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] naming the first zero setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::NotPositive("scan interval"));
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::NotPositive("failure threshold"));
        }
        if self.grace_cycles == 0 {
            return Err(ConfigError::NotPositive("grace period"));
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            failure_threshold: Self::DEFAULT_FAILURE_THRESHOLD,
            grace_cycles: Self::DEFAULT_GRACE_CYCLES,
        }
    }
}
