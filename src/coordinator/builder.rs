// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builder for [`Coordinator`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Clock, Coordinator, CoordinatorConfig};
use crate::device::DeviceClient;
use crate::error::Error;
use crate::event::EventBus;
use crate::protocol::Transport;

/// Builder for [`Coordinator`].
///
/// # Examples
///
/// ```no_run
/// use stmctrl_lib::{Coordinator, CoordinatorConfig, DeviceClient};
/// use std::time::Duration;
///
/// # fn example() -> stmctrl_lib::Result<()> {
/// let coordinator = Coordinator::builder(DeviceClient::http("192.168.1.100")?)
///     .config(CoordinatorConfig::default().with_update_interval(Duration::from_secs(10)))
///     .event_capacity(16)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct CoordinatorBuilder<T: Transport> {
    client: DeviceClient<T>,
    config: CoordinatorConfig,
    clock: Option<Clock>,
    event_capacity: Option<usize>,
}

impl<T: Transport> CoordinatorBuilder<T> {
    pub(crate) fn new(client: DeviceClient<T>) -> Self {
        Self {
            client,
            config: CoordinatorConfig::default(),
            clock: None,
            event_capacity: None,
        }
    }

    /// Sets the poll timings.
    #[must_use]
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the wall clock used to compute boot times.
    #[must_use]
    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Sets how many events the event bus buffers per subscriber (at least 1).
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity.max(1));
        self
    }

    /// Builds the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`](crate::error::ConfigError::Invalid)
    /// if the timings are unusable.
    pub fn build(self) -> Result<Coordinator<T>, Error> {
        self.config.validate()?;
        let clock: Clock = match self.clock {
            Some(clock) => clock,
            None => Arc::new(Utc::now),
        };
        let events = self
            .event_capacity
            .map_or_else(EventBus::new, EventBus::with_capacity);
        Ok(Coordinator::from_parts(self.client, self.config, clock, events))
    }
}

impl<T: Transport + fmt::Debug> fmt::Debug for CoordinatorBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorBuilder")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
