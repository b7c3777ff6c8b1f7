// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed entities derived from the capability descriptor.
//!
//! A host exposes each controller channel as one or more entities. The
//! catalogue is computed once from the [`DeviceDescriptor`] by [`discover`];
//! each [`EntitySpec`] then reads its current value from any published
//! [`CoordinatorData`](crate::coordinator::CoordinatorData).
//!
//! | Kind | Platform |
//! |------|----------|
//! | `relay` | [`Platform::Switch`] and an impulse [`Platform::Button`] |
//! | `v_switch` | [`Platform::Switch`] |
//! | `light` | [`Platform::Light`] |
//! | `v_numeric` | [`Platform::Number`] |
//! | `button`, `binary_sensor`, `v_binary_sensor` | [`Platform::BinarySensor`] |
//! | `v_button` | [`Platform::Button`] |
//! | `analog_in`, `counter`, `temperature` | [`Platform::Sensor`] |
//!
//! Every controller also gets one [`Platform::Timestamp`] entity reporting
//! its estimated boot time.
//!
//! [`DeviceDescriptor`]: crate::DeviceDescriptor

mod device_info;
mod registry;
mod spec;

pub use device_info::{DeviceInfo, MANUFACTURER};
pub use registry::discover;
pub use spec::{EntitySource, EntitySpec, EntityValue};

use std::fmt;

/// Host platform an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Controllable on/off output.
    Switch,
    /// Controllable light output.
    Light,
    /// Settable integer register.
    Number,
    /// Stateless action.
    Button,
    /// Read-only on/off input.
    BinarySensor,
    /// Read-only measurement.
    Sensor,
    /// Read-only point in time.
    Timestamp,
}

impl Platform {
    /// Returns the platform name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Light => "light",
            Self::Number => "number",
            Self::Button => "button",
            Self::BinarySensor => "binary_sensor",
            Self::Sensor => "sensor",
            Self::Timestamp => "datetime",
        }
    }

    /// Returns `true` if entities of this platform carry a value.
    #[must_use]
    pub const fn has_state(&self) -> bool {
        !matches!(self, Self::Button)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
