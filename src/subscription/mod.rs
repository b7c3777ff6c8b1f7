// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synchronous listeners for published snapshots.
//!
//! Listeners are plain closures called in registration-independent order
//! right after a successful cycle replaces the cached data, before the cycle
//! returns. For asynchronous consumers use
//! [`Coordinator::watch`](crate::Coordinator::watch) or
//! [`Coordinator::subscribe`](crate::Coordinator::subscribe) instead.
//!
//! ```no_run
//! use stmctrl_lib::{Coordinator, DeviceClient, CoordinatorConfig};
//! use stmctrl_lib::subscription::Subscribable;
//!
//! # fn example() -> stmctrl_lib::Result<()> {
//! let coordinator = Coordinator::new(DeviceClient::http("192.168.1.100")?, CoordinatorConfig::default())?;
//!
//! let id = coordinator.add_listener(|data| {
//!     println!("uptime {:?}", data.state().uptime());
//! });
//!
//! coordinator.remove_listener(id);
//! # Ok(())
//! # }
//! ```

mod listener;

pub use listener::{ListenerRegistry, SubscriptionId};

use crate::coordinator::CoordinatorData;

/// Types that accept snapshot listeners.
pub trait Subscribable {
    /// Registers a listener called after every successful cycle.
    fn add_listener<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CoordinatorData) + Send + Sync + 'static;

    /// Removes a listener. Returns `true` if it was registered.
    fn remove_listener(&self, id: SubscriptionId) -> bool;
}
