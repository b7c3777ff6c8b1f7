// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller capability descriptor.
//!
//! The descriptor is the body of `GET /system_info`. It names every channel
//! kind the controller exposes, either as a plain count (`"relay": 4`) or as
//! a structured value (`"temperature": {"addr": [...]}`), together with the
//! firmware `version` and the `device_index` used to prefix unique ids.
//!
//! It is fetched once per coordinator and never changes afterwards.

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::types::{ChannelIndex, ChannelKind};

/// A single descriptor entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Capability<'a> {
    /// Number of channels of this kind.
    Count(u32),
    /// Any other JSON value (sensor address lists, bound arrays, ...).
    Structured(&'a Value),
}

/// Inclusive value range of a virtual numeric channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericBounds {
    /// Smallest accepted value.
    pub min: i64,
    /// Largest accepted value.
    pub max: i64,
}

impl NumericBounds {
    /// Returns `true` if `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Immutable capability manifest of one controller.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::DeviceDescriptor;
/// use stmctrl_lib::types::ChannelKind;
///
/// let descriptor = DeviceDescriptor::from_json(serde_json::json!({
///     "relay": 2,
///     "device_index": "7",
/// }))
/// .unwrap();
///
/// assert_eq!(descriptor.count(ChannelKind::Relay), 2);
/// assert_eq!(descriptor.device_index().as_deref(), Some("7"));
/// assert_eq!(descriptor.version(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceDescriptor {
    raw: Map<String, Value>,
}

impl DeviceDescriptor {
    const VERSION_KEY: &'static str = "version";
    const DEVICE_INDEX_KEY: &'static str = "device_index";
    const NUMERIC_MIN_KEY: &'static str = "v_numeric_min";
    const NUMERIC_MAX_KEY: &'static str = "v_numeric_max";

    /// Builds a descriptor from the `system_info` body.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnexpectedFormat`] if the body is not a JSON object.
    pub fn from_json(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(ParseError::UnexpectedFormat(format!(
                "system_info must be an object, got {other}"
            ))),
        }
    }

    /// Returns the entry named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Capability<'_>> {
        let value = self.raw.get(name)?;
        match value.as_u64() {
            Some(count) => Some(Capability::Count(
                u32::try_from(count).unwrap_or(u32::MAX),
            )),
            None => Some(Capability::Structured(value)),
        }
    }

    /// Returns the number of channels of `kind`, or 0 if absent.
    ///
    /// Temperature probes are counted by their reported addresses.
    #[must_use]
    pub fn count(&self, kind: ChannelKind) -> u32 {
        if kind == ChannelKind::Temperature {
            return u32::try_from(self.temperature_addresses().len()).unwrap_or(u32::MAX);
        }
        match self.get(kind.key()) {
            Some(Capability::Count(count)) => count,
            _ => self.legacy_count(kind),
        }
    }

    fn legacy_count(&self, kind: ChannelKind) -> u32 {
        if kind != ChannelKind::VirtualSwitch {
            return 0;
        }
        match self.get("virtual_switch") {
            Some(Capability::Count(count)) => count,
            _ => 0,
        }
    }

    /// Returns `true` if channel `index` of `kind` exists.
    #[must_use]
    pub fn has_channel(&self, kind: ChannelKind, index: ChannelIndex) -> bool {
        index.value() <= self.count(kind)
    }

    /// Returns the channel kinds present on the controller.
    pub fn kinds(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        ChannelKind::ALL
            .into_iter()
            .filter(|kind| self.count(*kind) > 0)
    }

    /// Returns the 1-Wire addresses of the attached temperature probes.
    #[must_use]
    pub fn temperature_addresses(&self) -> Vec<&str> {
        self.raw
            .get(ChannelKind::Temperature.key())
            .and_then(|t| t.get("addr"))
            .and_then(Value::as_array)
            .map(|addrs| addrs.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the value range of virtual numeric channel `index`.
    ///
    /// Both `v_numeric_min` and `v_numeric_max` must carry an integer at the
    /// channel's position.
    #[must_use]
    pub fn numeric_bounds(&self, index: ChannelIndex) -> Option<NumericBounds> {
        let bound = |key: &str| {
            self.raw
                .get(key)
                .and_then(Value::as_array)
                .and_then(|values| values.get(index.position()))
                .and_then(Value::as_i64)
        };
        Some(NumericBounds {
            min: bound(Self::NUMERIC_MIN_KEY)?,
            max: bound(Self::NUMERIC_MAX_KEY)?,
        })
    }

    /// Returns the firmware version, or 0 if not reported.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.raw
            .get(Self::VERSION_KEY)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    }

    /// Returns the unique-id prefix reported by the controller.
    ///
    /// Numeric indices are rendered as strings.
    #[must_use]
    pub fn device_index(&self) -> Option<String> {
        match self.raw.get(Self::DEVICE_INDEX_KEY)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Returns the raw `system_info` object.
    #[must_use]
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.raw
    }
}
