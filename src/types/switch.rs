// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch state for boolean channels.

use std::fmt;

use serde_json::Value;

/// On/off state of a boolean channel.
///
/// The controller reports boolean channels as `0`/`1` and accepts the same
/// values in commands.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::types::SwitchState;
///
/// assert_eq!(SwitchState::from(true), SwitchState::On);
/// assert_eq!(SwitchState::Off.as_param(), "0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchState {
    /// Channel is off.
    Off,
    /// Channel is on.
    On,
}

impl SwitchState {
    /// Returns the command parameter value.
    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::On => "1",
        }
    }

    /// Returns `true` if the state is [`SwitchState::On`].
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    /// Interprets a raw state value.
    ///
    /// Numbers are on when non-zero; JSON booleans map directly. Any other
    /// value yields `None`.
    #[must_use]
    pub fn from_raw(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::from(*b)),
            Value::Number(n) => n.as_f64().map(|v| Self::from(v.abs() > f64::EPSILON)),
            _ => None,
        }
    }
}

impl From<bool> for SwitchState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::On => "on",
        })
    }
}
