// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted controller configuration.
//!
//! A host stores one [`ControllerConfig`] per controller as pretty-printed
//! JSON. Only the address is required:
//!
//! ```json
//! {
//!   "address": "192.168.1.100",
//!   "update_interval_secs": 5
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordinator::CoordinatorConfig;
use crate::error::{ConfigError, Error};
use crate::protocol::parse_address;

#[cfg(feature = "http")]
use crate::coordinator::Coordinator;
#[cfg(feature = "http")]
use crate::device::DeviceClient;
#[cfg(feature = "http")]
use crate::protocol::{HttpClient, HttpConfig};

fn default_update_interval_secs() -> u64 {
    CoordinatorConfig::DEFAULT_UPDATE_INTERVAL.as_secs()
}

fn default_cycle_timeout_secs() -> u64 {
    CoordinatorConfig::DEFAULT_CYCLE_TIMEOUT.as_secs()
}

fn default_unavailable_after() -> u32 {
    CoordinatorConfig::DEFAULT_UNAVAILABLE_AFTER
}

/// Settings of one controller.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::ControllerConfig;
///
/// let config: ControllerConfig =
///     serde_json::from_str(r#"{"address": "10.0.0.5", "port": 8080}"#).unwrap();
///
/// assert_eq!(config.port, Some(8080));
/// assert_eq!(config.coordinator_config().unwrap().update_interval().as_secs(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Dotted-quad IPv4 address.
    pub address: String,
    /// HTTP port, 80 if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Seconds between scheduled cycles.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    /// Time budget of one cycle, in seconds.
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,
    /// Consecutive failed cycles before the device is reported unavailable.
    #[serde(default = "default_unavailable_after")]
    pub unavailable_after: u32,
}

impl ControllerConfig {
    /// Creates a configuration with default timings.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: None,
            update_interval_secs: default_update_interval_secs(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            unavailable_after: default_unavailable_after(),
        }
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Json`] if it does not match this schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %path.display(), address = %config.address, "Loaded controller config");
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data).map_err(io_error)?;

        tracing::debug!(path = %path.display(), address = %self.address, "Saved controller config");
        Ok(())
    }

    /// Returns the validated poll timings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero timings.
    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, ConfigError> {
        let config = CoordinatorConfig::new()
            .with_update_interval(Duration::from_secs(self.update_interval_secs))
            .with_cycle_timeout(Duration::from_secs(self.cycle_timeout_secs))
            .with_unavailable_after(self.unavailable_after);
        config.validate()?;
        Ok(config)
    }

    /// Checks the address and timings.
    ///
    /// # Errors
    ///
    /// Returns error if the address is malformed or a timing is unusable.
    pub fn validate(&self) -> Result<(), Error> {
        parse_address(&self.address)?;
        self.coordinator_config()?;
        Ok(())
    }

    /// Returns the HTTP connection settings.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let config = HttpConfig::new(self.address.clone());
        match self.port {
            Some(port) => config.with_port(port),
            None => config,
        }
    }

    /// Builds an HTTP coordinator for this controller.
    ///
    /// # Errors
    ///
    /// Returns error if the address is malformed or a timing is unusable.
    #[cfg(feature = "http")]
    pub fn build_coordinator(&self) -> Result<Coordinator<HttpClient>, Error> {
        let client = DeviceClient::http_config(self.http_config())?;
        Coordinator::new(client, self.coordinator_config()?)
    }
}
