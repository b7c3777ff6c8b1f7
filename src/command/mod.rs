// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller command definitions.
//!
//! Every write goes to `POST /<kind>` with one `<index>=<value>` parameter per
//! addressed channel.
//!
//! | Value | Sent as | Accepted by |
//! |-------|---------|-------------|
//! | [`CommandValue::Switch`] | `0` / `1` | relay, v_switch, light |
//! | [`CommandValue::Number`] | integer | v_numeric |
//! | [`CommandValue::Impulse`] | `i` | relay |
//! | [`CommandValue::Press`] | `1` | v_button |
//!
//! # Examples
//!
//! ```
//! use stmctrl_lib::command::{ChannelCommand, Command};
//! use stmctrl_lib::types::{ChannelIndex, ChannelKind, SwitchState};
//!
//! let cmd = ChannelCommand::switch(ChannelKind::Relay, ChannelIndex::first(), SwitchState::Off)
//!     .unwrap();
//!
//! assert_eq!(cmd.endpoint(), "relay");
//! assert_eq!(cmd.params().encode(), "1=0");
//! ```

mod channel;

pub use channel::{ChannelCommand, CommandValue};

use crate::protocol::Params;

/// A command that can be sent to the controller.
pub trait Command {
    /// Returns the endpoint, without leading slash.
    fn endpoint(&self) -> &str;

    /// Returns the request parameters.
    fn params(&self) -> Params;
}
