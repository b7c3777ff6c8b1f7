// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `stmctrl` library.
//!
//! This module provides the error hierarchy used across the library: value
//! validation, protocol communication, JSON parsing, device capability checks,
//! and the [`UpdateFailed`] signal produced by a failed poll cycle.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::types::ChannelKind;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during device operations.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A poll cycle failed.
    #[error(transparent)]
    UpdateFailed(#[from] UpdateFailed),

    /// Error occurred while loading or validating configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns `true` for failures that may clear up on the next poll cycle.
    ///
    /// Address and method errors are programming or configuration mistakes
    /// and will never succeed on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Protocol(err) => err.is_transient(),
            Self::Parse(_) | Self::UpdateFailed(_) => true,
            Self::Value(_) | Self::Device(_) | Self::Config(_) => false,
        }
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// Channel indices are 1-based.
    #[error("channel index must be at least 1, got {0}")]
    InvalidChannelIndex(u32),

    /// An unknown channel kind name was provided.
    #[error("unknown channel kind: {0}")]
    UnknownChannelKind(String),

    /// The channel kind does not accept this kind of command.
    #[error("{kind} does not accept {command} commands")]
    UnsupportedCommand {
        /// The addressed channel kind.
        kind: ChannelKind,
        /// Short description of the rejected command.
        command: &'static str,
    },
}

/// Errors related to communication with the controller.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The device address is not a dotted-quad IPv4 address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The request used a verb other than `GET` or `POST`.
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    /// The device answered with a non-200 status.
    #[error("API error on /{endpoint} (params: {params}): HTTP {status}")]
    Api {
        /// The requested endpoint, without leading slash.
        endpoint: String,
        /// The encoded request parameters.
        params: String,
        /// The HTTP status returned by the device.
        status: u16,
    },

    /// The request could not be delivered or its response not read.
    #[error("connection to /{endpoint} failed: {source}")]
    Connection {
        /// The requested endpoint, without leading slash.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A poll cycle exceeded its time budget.
    #[error("request timed out after {0} ms")]
    Timeout(u64),
}

impl ProtocolError {
    /// Wraps a transport failure for `endpoint`.
    pub fn connection(
        endpoint: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if the failure may clear up on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::Connection { .. } | Self::Timeout(_)
        )
    }
}

/// Errors related to parsing controller responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The descriptor does not expose the addressed channel.
    #[error("device has no {kind} channel {index}")]
    UnsupportedChannel {
        /// The addressed channel kind.
        kind: ChannelKind,
        /// The 1-based channel index.
        index: u32,
    },

    /// The capability descriptor has not been fetched yet.
    #[error("device descriptor not loaded")]
    DescriptorNotLoaded,
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    /// A setting has an unusable value.
    #[error("invalid setting {field}: {message}")]
    Invalid {
        /// The offending setting.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// A poll cycle failed; carries the underlying cause.
///
/// Cloning is cheap so that every caller joining the same cycle can receive
/// the outcome.
#[derive(Debug, Clone, Error)]
#[error("update failed: {cause}")]
pub struct UpdateFailed {
    #[source]
    cause: Arc<Error>,
}

impl UpdateFailed {
    /// Wraps the cause of a failed cycle.
    #[must_use]
    pub fn new(cause: Error) -> Self {
        Self {
            cause: Arc::new(cause),
        }
    }

    /// Returns the underlying cause.
    #[must_use]
    pub fn cause(&self) -> &Error {
        &self.cause
    }

    /// Returns `true` if the cycle was aborted by its timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(*self.cause, Error::Protocol(ProtocolError::Timeout(_)))
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }

    #[test]
    fn api_error_display_carries_diagnostics() {
        let err = ProtocolError::Api {
            endpoint: "relay".to_string(),
            params: "1=0".to_string(),
            status: 500,
        };
        assert_eq!(
            err.to_string(),
            "API error on /relay (params: 1=0): HTTP 500"
        );
    }

    #[test]
    fn error_from_protocol_error() {
        let err: Error = ProtocolError::InvalidMethod("PUT".to_string()).into();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::InvalidMethod(ref m)) if m == "PUT"
        ));
    }

    #[test]
    fn transient_classification() {
        assert!(ProtocolError::Timeout(10).is_transient());
        assert!(ProtocolError::connection("state", "refused").is_transient());
        assert!(!ProtocolError::InvalidAddress("x".to_string()).is_transient());

        let err: Error = ValueError::InvalidChannelIndex(0).into();
        assert!(!err.is_transient());
    }

    #[test]
    fn update_failed_exposes_cause_as_source() {
        let failed = UpdateFailed::new(ProtocolError::Timeout(5000).into());
        assert!(failed.is_timeout());
        assert!(failed.source().is_some());
        assert_eq!(
            failed.to_string(),
            "update failed: protocol error: request timed out after 5000 ms"
        );

        let cloned = failed.clone();
        assert!(matches!(cloned.cause(), Error::Protocol(_)));
    }

    #[test]
    fn config_errors_are_permanent() {
        let err: Error = ConfigError::Invalid {
            field: "update_interval",
            message: "must be non-zero".to_string(),
        }
        .into();
        assert!(!err.is_transient());
        assert_eq!(
            err.to_string(),
            "config error: invalid setting update_interval: must be non-zero"
        );
    }

    #[test]
    fn device_error_display() {
        let err = DeviceError::UnsupportedChannel {
            kind: ChannelKind::Relay,
            index: 5,
        };
        assert_eq!(err.to_string(), "device has no relay channel 5");
    }
}
