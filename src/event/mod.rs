// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for poll cycle outcomes.
//!
//! Every [`Coordinator`](crate::Coordinator) owns an [`EventBus`] that
//! broadcasts a [`CoordinatorEvent`] for each published snapshot, failed
//! cycle, detected reboot, failed reconciliation and availability change.
//! Subscribers that fall behind lose the oldest events.
//!
//! # Examples
//!
//! ```
//! use stmctrl_lib::event::{CoordinatorEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(CoordinatorEvent::AvailabilityChanged { available: false });
//! assert!(matches!(
//!     rx.try_recv(),
//!     Ok(CoordinatorEvent::AvailabilityChanged { available: false })
//! ));
//! ```

mod coordinator_event;
mod event_bus;

pub use coordinator_event::CoordinatorEvent;
pub use event_bus::EventBus;
