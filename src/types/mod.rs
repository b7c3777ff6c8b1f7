// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for controller access.
//!
//! # Types
//!
//! - [`ChannelKind`] - Category of I/O point (relay, virtual switch, ...)
//! - [`ChannelIndex`] - 1-based channel address within a kind
//! - [`SwitchState`] - On/Off state of boolean channels

mod channel;
mod switch;

pub use channel::{ChannelIndex, ChannelKind, ValueKind};
pub use switch::SwitchState;
