// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel kinds and channel addressing.
//!
//! The controller groups its I/O points into kinds (relays, virtual switches,
//! analog inputs, ...). Each kind is a JSON key in both `system_info` and
//! `state`, and channels within a kind are addressed by a 1-based index.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// A category of I/O point on the controller.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::types::ChannelKind;
///
/// let kind: ChannelKind = "v_numeric".parse().unwrap();
/// assert_eq!(kind, ChannelKind::VirtualNumeric);
/// assert_eq!(kind.key(), "v_numeric");
/// assert!(kind.is_reconciled());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    /// Physical relay output.
    Relay,
    /// Firmware-side boolean flag.
    VirtualSwitch,
    /// Firmware-side integer register.
    VirtualNumeric,
    /// Lighting output (on/off only).
    Light,
    /// Physical push button input.
    Button,
    /// Physical binary input.
    BinarySensor,
    /// Firmware-side binary input.
    VirtualBinarySensor,
    /// Firmware-side momentary trigger; write-only.
    VirtualButton,
    /// Analog input reading.
    AnalogIn,
    /// Pulse counter (energy meter).
    Counter,
    /// 1-Wire DS18B20 temperature probes, keyed by bus address.
    Temperature,
}

/// How the raw values of a channel kind are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// 0/1 values.
    Boolean,
    /// Integer or floating point values.
    Numeric,
    /// Address-keyed floating point readings.
    Temperature,
    /// No readable state.
    Trigger,
}

impl ChannelKind {
    /// Every known channel kind, in registration order.
    pub const ALL: [Self; 11] = [
        Self::Relay,
        Self::VirtualSwitch,
        Self::VirtualNumeric,
        Self::Light,
        Self::Button,
        Self::BinarySensor,
        Self::VirtualBinarySensor,
        Self::VirtualButton,
        Self::AnalogIn,
        Self::Counter,
        Self::Temperature,
    ];

    /// Kinds whose last known values are replayed after a reboot, in replay order.
    pub const RECONCILED: [Self; 3] = [Self::VirtualNumeric, Self::VirtualSwitch, Self::Relay];

    /// Returns the JSON key and endpoint name for this kind.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::VirtualSwitch => "v_switch",
            Self::VirtualNumeric => "v_numeric",
            Self::Light => "light",
            Self::Button => "button",
            Self::BinarySensor => "binary_sensor",
            Self::VirtualBinarySensor => "v_binary_sensor",
            Self::VirtualButton => "v_button",
            Self::AnalogIn => "analog_in",
            Self::Counter => "counter",
            Self::Temperature => "temperature",
        }
    }

    /// Looks up a kind by its JSON key.
    ///
    /// Older firmware reports virtual switches as `virtual_switch`; both
    /// spellings are accepted.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "virtual_switch" => Some(Self::VirtualSwitch),
            _ => Self::ALL.into_iter().find(|kind| kind.key() == key),
        }
    }

    /// Returns how raw values of this kind are interpreted.
    #[must_use]
    pub const fn value_kind(&self) -> ValueKind {
        match self {
            Self::Relay
            | Self::VirtualSwitch
            | Self::Light
            | Self::Button
            | Self::BinarySensor
            | Self::VirtualBinarySensor => ValueKind::Boolean,
            Self::VirtualNumeric | Self::AnalogIn | Self::Counter => ValueKind::Numeric,
            Self::Temperature => ValueKind::Temperature,
            Self::VirtualButton => ValueKind::Trigger,
        }
    }

    /// Returns `true` if the kind accepts on/off commands.
    #[must_use]
    pub const fn is_switchable(&self) -> bool {
        matches!(self, Self::Relay | Self::VirtualSwitch | Self::Light)
    }

    /// Returns `true` if the controller accepts `POST /<kind>` for the kind.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.is_switchable() || matches!(self, Self::VirtualNumeric | Self::VirtualButton)
    }

    /// Returns `true` if the kind is replayed after a detected reboot.
    #[must_use]
    pub const fn is_reconciled(&self) -> bool {
        matches!(self, Self::VirtualNumeric | Self::VirtualSwitch | Self::Relay)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ChannelKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| ValueError::UnknownChannelKind(s.to_string()))
    }
}

/// 1-based index of a channel within its kind.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::types::ChannelIndex;
///
/// let idx = ChannelIndex::new(3).unwrap();
/// assert_eq!(idx.value(), 3);
/// assert_eq!(idx.position(), 2);
///
/// assert!(ChannelIndex::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelIndex(u32);

impl ChannelIndex {
    /// Creates a new channel index.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidChannelIndex`] if `index` is 0.
    pub const fn new(index: u32) -> Result<Self, ValueError> {
        if index == 0 {
            Err(ValueError::InvalidChannelIndex(index))
        } else {
            Ok(Self(index))
        }
    }

    /// Returns the first channel.
    #[must_use]
    pub const fn first() -> Self {
        Self(1)
    }

    /// Returns the 1-based value sent on the wire.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns the 0-based position in a state array.
    #[must_use]
    pub const fn position(&self) -> usize {
        (self.0 - 1) as usize
    }

    /// Returns every index from 1 through `count`.
    pub fn up_to(count: u32) -> impl Iterator<Item = Self> {
        (1..=count).map(Self)
    }
}

impl fmt::Display for ChannelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for ChannelIndex {
    type Error = ValueError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
