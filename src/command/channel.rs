// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel write commands.

use std::fmt;

use crate::error::ValueError;
use crate::protocol::Params;
use crate::types::{ChannelIndex, ChannelKind, SwitchState};

use super::Command;

/// Value written to one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandValue {
    /// Boolean output.
    Switch(SwitchState),
    /// Integer register value.
    Number(i64),
    /// Momentary relay actuation.
    Impulse,
    /// Virtual button press.
    Press,
}

impl CommandValue {
    /// Returns the parameter value sent on the wire.
    #[must_use]
    pub fn as_param(&self) -> String {
        match self {
            Self::Switch(state) => state.as_param().to_string(),
            Self::Number(n) => n.to_string(),
            Self::Impulse => "i".to_string(),
            Self::Press => "1".to_string(),
        }
    }
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_param())
    }
}

/// Write to one or more channels of a single kind.
///
/// Single-channel constructors validate that the kind accepts the value.
/// Multi-channel commands, used to replay values after a reboot, are built
/// with [`ChannelCommand::new`] and [`ChannelCommand::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCommand {
    kind: ChannelKind,
    values: Vec<(ChannelIndex, CommandValue)>,
}

impl ChannelCommand {
    /// Creates an empty command for `kind`.
    #[must_use]
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            values: Vec::new(),
        }
    }

    /// Appends a channel value.
    pub fn push(&mut self, index: ChannelIndex, value: CommandValue) {
        self.values.push((index, value));
    }

    /// Turns a relay, virtual switch or light on or off.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedCommand`] for kinds that cannot be switched.
    pub fn switch(
        kind: ChannelKind,
        index: ChannelIndex,
        state: SwitchState,
    ) -> Result<Self, ValueError> {
        if !kind.is_switchable() {
            return Err(ValueError::UnsupportedCommand {
                kind,
                command: "switch",
            });
        }
        Ok(Self::single(kind, index, CommandValue::Switch(state)))
    }

    /// Sets a virtual numeric register.
    #[must_use]
    pub fn set_number(index: ChannelIndex, value: i64) -> Self {
        Self::single(
            ChannelKind::VirtualNumeric,
            index,
            CommandValue::Number(value),
        )
    }

    /// Pulses a relay.
    #[must_use]
    pub fn impulse(index: ChannelIndex) -> Self {
        Self::single(ChannelKind::Relay, index, CommandValue::Impulse)
    }

    /// Presses a virtual button.
    #[must_use]
    pub fn press(index: ChannelIndex) -> Self {
        Self::single(ChannelKind::VirtualButton, index, CommandValue::Press)
    }

    fn single(kind: ChannelKind, index: ChannelIndex, value: CommandValue) -> Self {
        Self {
            kind,
            values: vec![(index, value)],
        }
    }

    /// Returns the addressed channel kind.
    #[must_use]
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Returns the addressed channels and their values.
    #[must_use]
    pub fn values(&self) -> &[(ChannelIndex, CommandValue)] {
        &self.values
    }

    /// Returns `true` if no channel is addressed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Command for ChannelCommand {
    fn endpoint(&self) -> &str {
        self.kind.key()
    }

    fn params(&self) -> Params {
        self.values
            .iter()
            .map(|(index, value)| (index.to_string(), value.as_param()))
            .collect()
    }
}
