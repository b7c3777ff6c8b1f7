// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `stmctrl` Lib - A Rust library to poll and control STM32 relay controllers.
//!
//! The controller is a small HTTP device exposing relays, lights, virtual
//! switches and registers, binary inputs, analog inputs, counters and
//! 1-Wire temperature probes. This library polls it on a fixed interval,
//! publishes typed snapshots to any number of observers, and forwards
//! commands back to the device.
//!
//! # Supported Features
//!
//! - **Polling**: Single-flight poll cycles with timeout and failure tracking
//! - **Reboot recovery**: Uptime-based restart detection, writable channel
//!   values replayed after a restart
//! - **Fan-out**: `watch` snapshots, synchronous listeners and a broadcast
//!   event bus
//! - **Commands**: Switch, impulse, virtual button and register writes
//! - **Entities**: Typed entity catalogue with stable unique ids
//!
//! # Quick Start
//!
//! ```no_run
//! use stmctrl_lib::{Coordinator, CoordinatorConfig, DeviceClient};
//! use stmctrl_lib::entity::EntityValue;
//! use stmctrl_lib::types::{ChannelIndex, ChannelKind};
//!
//! #[tokio::main]
//! async fn main() -> stmctrl_lib::Result<()> {
//!     let client = DeviceClient::http("192.168.1.100")?;
//!     let coordinator = Coordinator::new(client, CoordinatorConfig::default())?;
//!
//!     // Fails if the controller is unreachable
//!     let data = coordinator.first_refresh().await?;
//!
//!     for entity in coordinator.entities().unwrap_or_default() {
//!         if let Some(EntityValue::Bool(on)) = entity.read(&data) {
//!             println!("{}: {on}", entity.name());
//!         }
//!     }
//!
//!     // Poll every 5 seconds in the background
//!     let poller = coordinator.start();
//!
//!     coordinator
//!         .set_switch(ChannelKind::Relay, ChannelIndex::first(), true)
//!         .await?;
//!
//!     poller.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Observing Updates
//!
//! ```no_run
//! use stmctrl_lib::event::CoordinatorEvent;
//! use stmctrl_lib::{Coordinator, CoordinatorConfig, DeviceClient};
//!
//! # async fn example() -> stmctrl_lib::Result<()> {
//! let coordinator = Coordinator::new(
//!     DeviceClient::http("192.168.1.100")?,
//!     CoordinatorConfig::default(),
//! )?;
//! let mut events = coordinator.subscribe();
//! let _poller = coordinator.start();
//!
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         CoordinatorEvent::Updated(data) => println!("up {:?}", data.state().uptime()),
//!         CoordinatorEvent::RebootDetected(reboot) => {
//!             println!("restarted, works since {}", reboot.works_since);
//!         }
//!         other => println!("{other:?}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
mod config;
pub mod coordinator;
mod descriptor;
mod device;
pub mod entity;
pub mod error;
pub mod event;
pub mod protocol;
pub mod state;
pub mod subscription;
pub mod types;

pub use command::{ChannelCommand, Command, CommandValue};
pub use config::ControllerConfig;
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorData, Poller};
pub use descriptor::{Capability, DeviceDescriptor, NumericBounds};
pub use device::{DeviceClient, STATE_ENDPOINT, SYSTEM_INFO_ENDPOINT};
pub use error::{
    ConfigError, DeviceError, Error, ParseError, ProtocolError, Result, UpdateFailed, ValueError,
};
#[cfg(feature = "http")]
pub use protocol::{HttpClient, HttpConfig};
pub use state::DeviceState;
pub use subscription::{Subscribable, SubscriptionId};
pub use types::{ChannelIndex, ChannelKind, SwitchState};
