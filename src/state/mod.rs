// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller state snapshots.
//!
//! A [`DeviceState`] is the parsed body of `GET /state`. It is replaced as a
//! whole on every successful poll; nothing is merged field by field.
//!
//! # Examples
//!
//! ```
//! use stmctrl_lib::state::DeviceState;
//! use stmctrl_lib::types::{ChannelIndex, ChannelKind, SwitchState};
//!
//! let state = DeviceState::from_json(serde_json::json!({
//!     "relay": [1, 0],
//!     "up": 100,
//! }))
//! .unwrap();
//!
//! assert_eq!(
//!     state.switch_state(ChannelKind::Relay, ChannelIndex::first()),
//!     Some(SwitchState::On)
//! );
//! assert_eq!(state.uptime_seconds(), Some(100));
//! ```

mod device_state;

pub use device_state::DeviceState;
