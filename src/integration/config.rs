// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-facing configuration of one router installation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordinator::CoordinatorConfig;
use crate::error::{ConfigError, ParseError};
#[cfg(feature = "http")]
use crate::protocol::HttpConfig;

/// Connection and polling settings, as entered by the user.
///
/// Only `host` is required when deserializing; every other setting has a
/// default. The password is never serialized.
///
/// # Examples
///
/// ```
/// use azrouter_lib::integration::RouterConfig;
///
/// let config = RouterConfig::from_json(
///     r#"{"host": "192.168.1.50", "username": "admin", "password": "secret", "scan_interval": 10}"#,
/// )
/// .unwrap();
/// assert_eq!(config.scan_interval, 10);
/// assert_eq!(config.failure_threshold, 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Router address, optionally with a scheme.
    pub host: String,
    /// Login name; empty disables the login.
    #[serde(default)]
    pub username: String,
    /// Login password.
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Validate TLS certificates.
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    /// Use HTTPS.
    #[serde(default)]
    pub https: bool,
    /// Port; the scheme's default when absent.
    #[serde(default)]
    pub port: Option<u16>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Refresh interval in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    /// Consecutive master failures before the router is unavailable.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Cycles a missing device is kept before removal.
    #[serde(default = "default_grace_period")]
    pub grace_period: u32,
}

fn default_verify_ssl() -> bool {
    true
}

fn default_timeout() -> u64 {
    10
}

fn default_scan_interval() -> u64 {
    CoordinatorConfig::DEFAULT_INTERVAL.as_secs()
}

fn default_failure_threshold() -> u32 {
    CoordinatorConfig::DEFAULT_FAILURE_THRESHOLD
}

fn default_grace_period() -> u32 {
    CoordinatorConfig::DEFAULT_GRACE_CYCLES
}

impl RouterConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            verify_ssl: default_verify_ssl(),
            https: false,
            port: None,
            timeout: default_timeout(),
            scan_interval: default_scan_interval(),
            failure_threshold: default_failure_threshold(),
            grace_period: default_grace_period(),
        }
    }

    /// Parses a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the document is not a valid
    /// configuration.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the configuration before any connection attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingHost`] for a blank host and
    /// [`ConfigError::NotPositive`] for a zero timeout, interval, threshold
    /// or grace period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.timeout == 0 {
            return Err(ConfigError::NotPositive("timeout"));
        }
        if self.port == Some(0) {
            return Err(ConfigError::NotPositive("port"));
        }
        self.coordinator_config().validate()
    }

    /// Polling settings of this installation.
    #[must_use]
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::new()
            .with_interval(Duration::from_secs(self.scan_interval))
            .with_failure_threshold(self.failure_threshold)
            .with_grace_cycles(self.grace_period)
    }

    /// HTTP client settings of this installation.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let mut config = HttpConfig::new(self.host.as_str())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_verify_ssl(self.verify_ssl);
        if self.https {
            config = config.with_https();
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if !self.username.is_empty() {
            config = config.with_credentials(self.username.as_str(), self.password.as_str());
        }
        config
    }
}

impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .field("https", &self.https)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("scan_interval", &self.scan_interval)
            .field("failure_threshold", &self.failure_threshold)
            .field("grace_period", &self.grace_period)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_settings() {
        let config = RouterConfig::from_json(r#"{"host": "router.local"}"#).unwrap();
        assert_eq!(config, RouterConfig::new("router.local", "", ""));
        assert!(config.verify_ssl);
        assert_eq!(config.scan_interval, 30);
        assert_eq!(config.grace_period, 3);
    }

    #[test]
    fn host_is_required() {
        assert!(RouterConfig::from_json(r#"{"username": "admin"}"#).is_err());
        assert_eq!(
            RouterConfig::new("  ", "admin", "x").validate(),
            Err(ConfigError::MissingHost)
        );
    }

    #[test]
    fn zero_settings_are_rejected() {
        let mut config = RouterConfig::new("router.local", "admin", "x");
        config.scan_interval = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive("scan interval"))
        );

        let mut config = RouterConfig::new("router.local", "admin", "x");
        config.failure_threshold = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive("failure threshold"))
        );

        let mut config = RouterConfig::new("router.local", "admin", "x");
        config.timeout = 0;
        assert_eq!(config.validate(), Err(ConfigError::NotPositive("timeout")));
    }

    #[test]
    fn password_is_hidden() {
        let config = RouterConfig::new("router.local", "admin", "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
        assert!(!serde_json::to_string(&config).unwrap().contains("hunter2"));
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_config_follows_settings() {
        let mut config = RouterConfig::new("router.local", "admin", "x");
        config.https = true;
        config.timeout = 5;
        let http = config.http_config();
        assert_eq!(http.base_url(), "https://router.local");
        assert_eq!(http.timeout(), Duration::from_secs(5));
        assert_eq!(http.credentials(), Some(("admin", "x")));

        config.port = Some(8443);
        assert_eq!(config.http_config().base_url(), "https://router.local:8443");

        config.username.clear();
        assert!(config.http_config().credentials().is_none());
    }
}
