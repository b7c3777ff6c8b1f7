// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state snapshot.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::types::{ChannelIndex, ChannelKind, SwitchState};

/// Snapshot of controller state.
///
/// Channel values are kept as reported: arrays of raw values per kind, and
/// an object keyed by probe address for temperatures. Accessors return
/// `None` when the kind is missing or the array is shorter than the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    raw: Map<String, Value>,
    uptime: Option<u64>,
}

impl DeviceState {
    const UPTIME_KEY: &'static str = "up";

    /// Builds a state snapshot from the `state` body.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnexpectedFormat`] if the body is not an object,
    /// or [`ParseError::InvalidValue`] if `up` is present but not a
    /// non-negative integer.
    pub fn from_json(value: Value) -> Result<Self, ParseError> {
        let Value::Object(raw) = value else {
            return Err(ParseError::UnexpectedFormat(format!(
                "state must be an object, got {value}"
            )));
        };

        let uptime = match raw.get(Self::UPTIME_KEY) {
            None | Some(Value::Null) => None,
            Some(up) => Some(up.as_u64().ok_or_else(|| ParseError::InvalidValue {
                field: Self::UPTIME_KEY.to_string(),
                message: format!("expected non-negative integer seconds, got {up}"),
            })?),
        };

        Ok(Self { raw, uptime })
    }

    /// Returns the uptime counter in seconds, if the controller reports one.
    #[must_use]
    pub fn uptime_seconds(&self) -> Option<u64> {
        self.uptime
    }

    /// Returns the uptime counter as a [`Duration`].
    #[must_use]
    pub fn uptime(&self) -> Option<Duration> {
        self.uptime.map(Duration::from_secs)
    }

    /// Returns the raw value array for `kind`.
    ///
    /// Virtual switches reported under the legacy `virtual_switch` key are
    /// found as well.
    #[must_use]
    pub fn values(&self, kind: ChannelKind) -> Option<&[Value]> {
        let value = self.raw.get(kind.key()).or_else(|| match kind {
            ChannelKind::VirtualSwitch => self.raw.get("virtual_switch"),
            _ => None,
        })?;
        value.as_array().map(Vec::as_slice)
    }

    /// Returns the raw value of channel `index` of `kind`.
    #[must_use]
    pub fn raw_value(&self, kind: ChannelKind, index: ChannelIndex) -> Option<&Value> {
        self.values(kind)?.get(index.position())
    }

    /// Returns the on/off state of a boolean channel.
    #[must_use]
    pub fn switch_state(&self, kind: ChannelKind, index: ChannelIndex) -> Option<SwitchState> {
        SwitchState::from_raw(self.raw_value(kind, index)?)
    }

    /// Returns the numeric value of a channel.
    #[must_use]
    pub fn number(&self, kind: ChannelKind, index: ChannelIndex) -> Option<f64> {
        self.raw_value(kind, index)?.as_f64()
    }

    /// Returns the reading of the temperature probe at `address`.
    #[must_use]
    pub fn temperature(&self, address: &str) -> Option<f64> {
        self.raw
            .get(ChannelKind::Temperature.key())?
            .get(address)?
            .as_f64()
    }

    /// Returns the raw `state` object.
    #[must_use]
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.raw
    }
}
