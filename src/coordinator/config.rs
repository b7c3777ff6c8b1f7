// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll timing configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Timing of the poll cycle.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::CoordinatorConfig;
/// use std::time::Duration;
///
/// let config = CoordinatorConfig::default()
///     .with_update_interval(Duration::from_secs(2))
///     .with_unavailable_after(3);
///
/// assert_eq!(config.cycle_timeout(), Duration::from_secs(10));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    update_interval: Duration,
    cycle_timeout: Duration,
    unavailable_after: u32,
}

impl CoordinatorConfig {
    /// Default time between scheduled cycles.
    pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(5);
    /// Default time budget of one cycle.
    pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default number of consecutive failed cycles before the device is
    /// reported unavailable.
    pub const DEFAULT_UNAVAILABLE_AFTER: u32 = 1;

    /// Creates a configuration with default timings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            update_interval: Self::DEFAULT_UPDATE_INTERVAL,
            cycle_timeout: Self::DEFAULT_CYCLE_TIMEOUT,
            unavailable_after: Self::DEFAULT_UNAVAILABLE_AFTER,
        }
    }

    /// Sets the time between scheduled cycles.
    #[must_use]
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Sets the time budget of one cycle.
    #[must_use]
    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    /// Sets how many consecutive failures mark the device unavailable.
    #[must_use]
    pub fn with_unavailable_after(mut self, failures: u32) -> Self {
        self.unavailable_after = failures;
        self
    }

    /// Returns the time between scheduled cycles.
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Returns the time budget of one cycle.
    #[must_use]
    pub fn cycle_timeout(&self) -> Duration {
        self.cycle_timeout
    }

    /// Returns the failure threshold for unavailability.
    #[must_use]
    pub fn unavailable_after(&self) -> u32 {
        self.unavailable_after
    }

    /// Checks that the timings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the interval or the timeout is
    /// zero, or if `unavailable_after` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval.is_zero() {
            return Err(invalid("update_interval", "must be non-zero"));
        }
        if self.cycle_timeout.is_zero() {
            return Err(invalid("cycle_timeout", "must be non-zero"));
        }
        if self.unavailable_after == 0 {
            return Err(invalid("unavailable_after", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(field: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.to_string(),
    }
}
