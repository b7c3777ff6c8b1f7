// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic poll coordinator.
//!
//! A [`Coordinator`] owns the polling of one controller. Each cycle:
//!
//! 1. fetches the capability descriptor if it is not cached yet, then the
//!    state, both within `cycle_timeout`;
//! 2. feeds the reported uptime to the reboot detector;
//! 3. after a reboot, writes the writable channel values of the previous
//!    snapshot back to the device, again on the next cycle if the write-back
//!    was interrupted;
//! 4. replaces the published snapshot, calls listeners and broadcasts
//!    [`CoordinatorEvent::Updated`].
//!
//! A failed cycle leaves the previous snapshot in place and yields
//! [`UpdateFailed`]. Only one cycle runs at a time; a refresh requested
//! while a cycle is in flight waits for it and shares its outcome.
//!
//! # Examples
//!
//! ```no_run
//! use stmctrl_lib::{Coordinator, CoordinatorConfig, DeviceClient};
//! use stmctrl_lib::types::ChannelIndex;
//!
//! # async fn example() -> stmctrl_lib::Result<()> {
//! let client = DeviceClient::http("192.168.1.100")?;
//! let coordinator = Coordinator::new(client, CoordinatorConfig::default())?;
//!
//! // Abort setup if the controller cannot be reached
//! coordinator.first_refresh().await?;
//!
//! let poller = coordinator.start();
//! coordinator.pulse_relay(ChannelIndex::first()).await?;
//! poller.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod data;
mod poller;
mod reconcile;
mod uptime;

pub use builder::CoordinatorBuilder;
pub use config::CoordinatorConfig;
pub use data::CoordinatorData;
pub use poller::Poller;
pub use uptime::{Reboot, UptimeTracker};

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{Mutex as AsyncMutex, broadcast, watch};

use crate::command::{ChannelCommand, Command};
use crate::descriptor::DeviceDescriptor;
use crate::device::DeviceClient;
use crate::entity::{self, DeviceInfo, EntitySpec};
use crate::error::{DeviceError, Error, ProtocolError, UpdateFailed, ValueError};
use crate::event::{CoordinatorEvent, EventBus};
use crate::protocol::Transport;
use crate::state::DeviceState;
use crate::subscription::{ListenerRegistry, Subscribable, SubscriptionId};
use crate::types::{ChannelIndex, ChannelKind, SwitchState};

pub(crate) type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

type Outcome = Result<Arc<CoordinatorData>, UpdateFailed>;

#[derive(Debug, Default)]
struct Health {
    available: bool,
    consecutive_failures: u32,
    last_error: Option<UpdateFailed>,
}

struct Inner<T: Transport> {
    client: DeviceClient<T>,
    config: CoordinatorConfig,
    clock: Clock,
    descriptor: RwLock<Option<Arc<DeviceDescriptor>>>,
    data_tx: watch::Sender<Option<Arc<CoordinatorData>>>,
    cycle: AsyncMutex<()>,
    completed_cycles: AtomicU64,
    last_outcome: RwLock<Option<Outcome>>,
    uptime: Mutex<UptimeTracker>,
    pending_replay: Mutex<Option<Arc<DeviceState>>>,
    health: Mutex<Health>,
    listeners: ListenerRegistry<CoordinatorData>,
    events: EventBus,
}

/// Poll coordinator for one controller.
///
/// `Coordinator` is a cheap handle; clones share the same cache, listeners
/// and event bus.
pub struct Coordinator<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> fmt::Debug for Coordinator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("address", &self.inner.client.address())
            .field("config", &self.inner.config)
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Coordinator<T> {
    /// Creates a coordinator with the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`](crate::error::ConfigError::Invalid)
    /// if the timings are unusable.
    pub fn new(client: DeviceClient<T>, config: CoordinatorConfig) -> Result<Self, Error> {
        Self::builder(client).config(config).build()
    }

    /// Returns a builder for a coordinator over `client`.
    #[must_use]
    pub fn builder(client: DeviceClient<T>) -> CoordinatorBuilder<T> {
        CoordinatorBuilder::new(client)
    }

    pub(crate) fn from_parts(
        client: DeviceClient<T>,
        config: CoordinatorConfig,
        clock: Clock,
        events: EventBus,
    ) -> Self {
        let (data_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                client,
                config,
                clock,
                descriptor: RwLock::new(None),
                data_tx,
                cycle: AsyncMutex::new(()),
                completed_cycles: AtomicU64::new(0),
                last_outcome: RwLock::new(None),
                uptime: Mutex::new(UptimeTracker::new()),
                pending_replay: Mutex::new(None),
                health: Mutex::new(Health::default()),
                listeners: ListenerRegistry::new(),
                events,
            }),
        }
    }

    // ========== Accessors ==========

    /// Returns the controller address.
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.inner.client.address()
    }

    /// Returns the poll timings.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Returns the device client.
    #[must_use]
    pub fn client(&self) -> &DeviceClient<T> {
        &self.inner.client
    }

    /// Returns the cached capability descriptor.
    #[must_use]
    pub fn descriptor(&self) -> Option<Arc<DeviceDescriptor>> {
        self.inner.descriptor.read().clone()
    }

    /// Returns the current snapshot, if any cycle has succeeded.
    #[must_use]
    pub fn data(&self) -> Option<Arc<CoordinatorData>> {
        self.inner.data_tx.borrow().clone()
    }

    /// Returns a receiver notified whenever a new snapshot is published.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<Arc<CoordinatorData>>> {
        self.inner.data_tx.subscribe()
    }

    /// Subscribes to coordinator events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.events.subscribe()
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Returns the estimated boot time of the device.
    #[must_use]
    pub fn works_since(&self) -> Option<DateTime<Utc>> {
        self.inner.uptime.lock().works_since()
    }

    /// Returns the number of restarts detected since creation.
    #[must_use]
    pub fn reboot_count(&self) -> u64 {
        self.inner.uptime.lock().reboot_count()
    }

    /// Returns `true` while the device is considered reachable.
    ///
    /// A coordinator starts unavailable and becomes available on its first
    /// successful cycle.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.health.lock().available
    }

    /// Returns the error of the last cycle, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<UpdateFailed> {
        self.inner.health.lock().last_error.clone()
    }

    /// Returns the number of failed cycles since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.health.lock().consecutive_failures
    }

    /// Returns the registry metadata of the device.
    ///
    /// The firmware version is known once the descriptor is loaded.
    #[must_use]
    pub fn device_info(&self) -> DeviceInfo {
        let version = self.descriptor().map(|d| d.version());
        DeviceInfo::new(self.address(), version)
    }

    /// Returns the entity catalogue, once the descriptor is loaded.
    #[must_use]
    pub fn entities(&self) -> Option<Vec<EntitySpec>> {
        self.descriptor().map(|d| entity::discover(&d))
    }

    /// Spawns the background poll task.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use = "dropping the Poller stops polling"]
    pub fn start(&self) -> Poller {
        Poller::spawn(self.clone())
    }

    // ========== Refresh ==========

    /// Runs the initial cycle during setup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpdateFailed`] if the device cannot be polled; the
    /// caller should treat the device as not ready.
    pub async fn first_refresh(&self) -> Result<Arc<CoordinatorData>, Error> {
        Ok(self.refresh().await?)
    }

    /// Runs a poll cycle, or joins the one in flight.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateFailed`] with the cause if the cycle failed. The
    /// previous snapshot stays published.
    pub async fn refresh(&self) -> Result<Arc<CoordinatorData>, UpdateFailed> {
        let inner = &self.inner;
        let seen = inner.completed_cycles.load(Ordering::Acquire);

        let _cycle = inner.cycle.lock().await;

        if inner.completed_cycles.load(Ordering::Acquire) != seen {
            let shared = inner.last_outcome.read().clone();
            if let Some(outcome) = shared {
                tracing::trace!(address = %self.address(), "Joined in-flight cycle");
                return outcome;
            }
        }

        let outcome = self.run_cycle().await;
        *inner.last_outcome.write() = Some(outcome.clone());
        inner.completed_cycles.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn run_cycle(&self) -> Outcome {
        let timeout = self.inner.config.cycle_timeout();
        let fetched = match tokio::time::timeout(timeout, self.fetch()).await {
            Ok(result) => result,
            Err(_) => {
                let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                Err(ProtocolError::Timeout(millis).into())
            }
        };

        match fetched {
            Ok((descriptor, state)) => Ok(self.publish(descriptor, state).await),
            Err(e) => Err(self.record_failure(e)),
        }
    }

    async fn fetch(&self) -> Result<(Arc<DeviceDescriptor>, DeviceState), Error> {
        let descriptor = match self.descriptor() {
            Some(descriptor) => descriptor,
            None => {
                let descriptor = Arc::new(self.inner.client.fetch_capabilities().await?);
                tracing::info!(
                    address = %self.address(),
                    version = descriptor.version(),
                    kinds = ?descriptor.kinds().collect::<Vec<_>>(),
                    "Loaded device descriptor"
                );
                *self.inner.descriptor.write() = Some(Arc::clone(&descriptor));
                descriptor
            }
        };

        let state = self.inner.client.fetch_state().await?;
        Ok((descriptor, state))
    }

    async fn publish(
        &self,
        descriptor: Arc<DeviceDescriptor>,
        state: DeviceState,
    ) -> Arc<CoordinatorData> {
        let inner = &self.inner;
        let now = (inner.clock)();

        let (reboot, works_since) = {
            let mut tracker = inner.uptime.lock();
            let reboot = state
                .uptime_seconds()
                .and_then(|uptime| tracker.observe(uptime, now));
            (reboot, tracker.works_since())
        };

        if let Some(reboot) = reboot {
            tracing::info!(
                address = %self.address(),
                previous_uptime = reboot.previous_uptime,
                uptime = reboot.uptime,
                works_since = %reboot.works_since,
                "Device reboot detected"
            );
            inner.events.publish(CoordinatorEvent::RebootDetected(reboot));

            if let Some(previous) = self.data() {
                *inner.pending_replay.lock() = Some(Arc::clone(&previous.state));
            }
        }

        // Cleared only once the replay ran to completion; a cycle dropped
        // mid-replay leaves it for the next one.
        let pending = inner.pending_replay.lock().clone();
        if let Some(previous) = pending {
            reconcile::replay(&inner.client, &previous, &inner.events).await;
            *inner.pending_replay.lock() = None;
        }

        let data = Arc::new(CoordinatorData::new(
            descriptor,
            Arc::new(state),
            works_since,
            now,
        ));
        inner.data_tx.send_replace(Some(Arc::clone(&data)));
        self.record_success();

        inner.listeners.dispatch(&data);
        inner
            .events
            .publish(CoordinatorEvent::Updated(Arc::clone(&data)));

        tracing::debug!(address = %self.address(), "Published device state");
        data
    }

    fn record_success(&self) {
        let became_available = {
            let mut health = self.inner.health.lock();
            health.consecutive_failures = 0;
            health.last_error = None;
            !std::mem::replace(&mut health.available, true)
        };

        if became_available {
            tracing::info!(address = %self.address(), "Device available");
            self.inner
                .events
                .publish(CoordinatorEvent::AvailabilityChanged { available: true });
        }
    }

    fn record_failure(&self, cause: Error) -> UpdateFailed {
        let failed = UpdateFailed::new(cause);
        let threshold = self.inner.config.unavailable_after();

        let (failures, became_unavailable) = {
            let mut health = self.inner.health.lock();
            health.consecutive_failures = health.consecutive_failures.saturating_add(1);
            health.last_error = Some(failed.clone());
            let became_unavailable =
                health.available && health.consecutive_failures >= threshold;
            if became_unavailable {
                health.available = false;
            }
            (health.consecutive_failures, became_unavailable)
        };

        tracing::warn!(
            address = %self.address(),
            error = %failed,
            failures,
            "Poll cycle failed"
        );
        self.inner
            .events
            .publish(CoordinatorEvent::UpdateFailed(failed.clone()));

        if became_unavailable {
            self.inner
                .events
                .publish(CoordinatorEvent::AvailabilityChanged { available: false });
        }

        failed
    }

    // ========== Commands ==========

    /// Turns a relay, virtual switch or light on or off.
    ///
    /// # Errors
    ///
    /// Returns error if the kind cannot be switched, the channel does not
    /// exist, or the request fails.
    pub async fn set_switch(
        &self,
        kind: ChannelKind,
        index: ChannelIndex,
        on: bool,
    ) -> Result<(), Error> {
        let command = ChannelCommand::switch(kind, index, SwitchState::from(on))?;
        self.send_command(&command).await
    }

    /// Pulses a relay.
    ///
    /// # Errors
    ///
    /// Returns error if the relay does not exist or the request fails.
    pub async fn pulse_relay(&self, index: ChannelIndex) -> Result<(), Error> {
        self.send_command(&ChannelCommand::impulse(index)).await
    }

    /// Presses a virtual button.
    ///
    /// # Errors
    ///
    /// Returns error if the button does not exist or the request fails.
    pub async fn press_virtual_button(&self, index: ChannelIndex) -> Result<(), Error> {
        self.send_command(&ChannelCommand::press(index)).await
    }

    /// Sets a virtual numeric register.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::OutOfRange`] if the descriptor declares bounds
    /// for the register and `value` lies outside them, or error if the
    /// register does not exist or the request fails.
    pub async fn set_number(&self, index: ChannelIndex, value: i64) -> Result<(), Error> {
        let descriptor = self.descriptor().ok_or(DeviceError::DescriptorNotLoaded)?;
        if let Some(bounds) = descriptor.numeric_bounds(index) {
            if !bounds.contains(value) {
                return Err(ValueError::OutOfRange {
                    min: bounds.min,
                    max: bounds.max,
                    actual: value,
                }
                .into());
            }
        }
        self.send_command(&ChannelCommand::set_number(index, value))
            .await
    }

    /// Sends a channel command, then refreshes.
    ///
    /// Local state is never updated optimistically; the refresh publishes
    /// whatever the device reports. A failed refresh is logged and published
    /// as an event but not returned.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedCommand`] for read-only kinds and
    /// commands without values, [`DeviceError`] if the descriptor is not
    /// loaded or lacks an addressed channel, or error if the request fails.
    pub async fn send_command(&self, command: &ChannelCommand) -> Result<(), Error> {
        let kind = command.kind();
        if !kind.is_writable() {
            return Err(ValueError::UnsupportedCommand {
                kind,
                command: "write",
            }
            .into());
        }
        if command.is_empty() {
            return Err(ValueError::UnsupportedCommand {
                kind,
                command: "empty",
            }
            .into());
        }

        let descriptor = self.descriptor().ok_or(DeviceError::DescriptorNotLoaded)?;
        if let Some((index, _)) = command
            .values()
            .iter()
            .find(|(index, _)| !descriptor.has_channel(kind, *index))
        {
            return Err(DeviceError::UnsupportedChannel {
                kind,
                index: index.value(),
            }
            .into());
        }

        self.inner.client.send(command).await?;

        if let Err(e) = self.refresh().await {
            tracing::warn!(
                address = %self.address(),
                endpoint = command.endpoint(),
                error = %e,
                "Refresh after command failed"
            );
        }
        Ok(())
    }
}

impl<T: Transport> Subscribable for Coordinator<T> {
    fn add_listener<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CoordinatorData) + Send + Sync + 'static,
    {
        self.inner.listeners.add(listener)
    }

    fn remove_listener(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.remove(id)
    }
}

#[cfg(test)]
mod tests;
