// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `azrouter_lib` library.
//!
//! The hierarchy mirrors the way failures propagate through the crate:
//!
//! - [`ApiError`] - failures talking to the router (auth, network, payloads)
//! - [`ValueError`] - command values rejected before anything is sent
//! - [`ParseError`] - payloads that could not be read into the internal model
//! - [`ConfigError`] - invalid configuration detected at setup time
//!
//! Command-time failures that are not about the value itself
//! ([`Error::UnknownTarget`], [`Error::UnsupportedCommand`]) live directly on
//! [`Error`].

use thiserror::Error;

use crate::types::{DeviceId, DeviceType};

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Communication with the router failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// A command value failed validation.
    #[error("validation error: {0}")]
    Value(#[from] ValueError),

    /// A payload could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The command target is not currently known to the coordinator.
    #[error("unknown target: {0}")]
    UnknownTarget(String),

    /// No write path is declared for this field on this device type.
    #[error("{device_type} does not support writing {field}")]
    UnsupportedCommand {
        /// Device type of the resolved target.
        device_type: DeviceType,
        /// The requested field.
        field: String,
    },

    /// The coordinator has been shut down.
    #[error("coordinator is shut down")]
    ShutDown,
}

impl Error {
    /// Returns `true` if this error is caused by rejected credentials.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Api(ApiError::Auth))
    }

    /// Returns `true` if the router could not be reached.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Api(ApiError::Unreachable(_)))
    }
}

/// Errors reported by a [`RouterApi`](crate::protocol::RouterApi) implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// The router rejected the configured credentials.
    #[error("authentication failed")]
    Auth,

    /// Network failure or timeout.
    #[error("router unreachable: {0}")]
    Unreachable(String),

    /// The response could not be parsed or violates the expected schema.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The device is no longer reported by the master.
    #[error("device {0} not found")]
    NotFound(DeviceId),

    /// The router refused a write command.
    #[error("command rejected (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code returned by the router.
        status: u16,
        /// Truncated response body.
        message: String,
    },

    /// The command value failed the client-side re-validation.
    #[error("invalid command value: {0}")]
    Validation(#[from] ValueError),

    /// The configured address cannot be turned into a URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ApiError {
    /// Returns `true` for failures that are worth retrying on the next cycle.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Malformed(_))
    }
}

/// Errors related to command value validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
        /// The value that was provided.
        actual: f64,
    },

    /// A numeric value is not aligned to the declared step.
    #[error("value {actual} is not a multiple of {step} starting at {min}")]
    Misaligned {
        /// Lower bound the steps are counted from.
        min: f64,
        /// Step size.
        step: f64,
        /// The value that was provided.
        actual: f64,
    },

    /// The value is not a finite number.
    #[error("value {0} is not a finite number")]
    NotFinite(f64),

    /// A numeric value was given for a switch, or a boolean for a number.
    #[error("expected a {expected} value")]
    WrongKind {
        /// Human readable name of the expected kind.
        expected: &'static str,
    },
}

/// Errors related to parsing router payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Unexpected payload shape.
    #[error("unexpected payload format: {0}")]
    UnexpectedFormat(String),
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors detected while validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The host is empty.
    #[error("host must not be empty")]
    MissingHost,

    /// A numeric setting must be strictly positive.
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: -1000.0,
            max: 1000.0,
            actual: 1500.0,
        };
        assert_eq!(err.to_string(), "value 1500 is out of range [-1000, 1000]");
    }

    #[test]
    fn error_from_value_error() {
        let err: Error = ValueError::NotFinite(f64::NAN).into();
        assert!(matches!(err, Error::Value(ValueError::NotFinite(_))));
    }

    #[test]
    fn api_error_classification() {
        assert!(Error::from(ApiError::Auth).is_auth());
        assert!(Error::from(ApiError::Unreachable("timeout".into())).is_unreachable());
        assert!(ApiError::Malformed("x".into()).is_transient());
        assert!(!ApiError::Auth.is_transient());
    }

    #[test]
    fn parse_error_becomes_malformed() {
        let err: ApiError = ParseError::MissingField("common.id".to_string()).into();
        assert_eq!(
            err,
            ApiError::Malformed("missing field in payload: common.id".to_string())
        );
    }

    #[test]
    fn unsupported_command_display() {
        let err = Error::UnsupportedCommand {
            device_type: DeviceType::Master,
            field: "temperature".to_string(),
        };
        assert_eq!(err.to_string(), "master does not support writing temperature");
    }
}
