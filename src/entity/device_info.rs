// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry metadata.

use std::net::Ipv4Addr;

/// Manufacturer reported for every controller.
pub const MANUFACTURER: &str = "Alexander Nezvanov";

/// Metadata a host uses to register the controller.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::entity::DeviceInfo;
/// use std::net::Ipv4Addr;
///
/// let info = DeviceInfo::new(Ipv4Addr::new(192, 168, 1, 42), Some(3));
/// assert_eq!(info.name(), "Controller_1_42");
/// assert_eq!(info.identifier(), "192.168.1.42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    address: Ipv4Addr,
    name: String,
    sw_version: Option<u32>,
}

impl DeviceInfo {
    /// Builds the metadata for the controller at `address`.
    #[must_use]
    pub fn new(address: Ipv4Addr, sw_version: Option<u32>) -> Self {
        let [_, _, third, fourth] = address.octets();
        Self {
            address,
            name: format!("Controller_{third}_{fourth}"),
            sw_version,
        }
    }

    /// Returns the registry identifier (the controller address).
    #[must_use]
    pub fn identifier(&self) -> String {
        self.address.to_string()
    }

    /// Returns the controller address.
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Returns the manufacturer.
    #[must_use]
    pub fn manufacturer(&self) -> &'static str {
        MANUFACTURER
    }

    /// Returns the display name, built from the last two address octets.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the firmware version, if known.
    #[must_use]
    pub fn sw_version(&self) -> Option<u32> {
        self.sw_version
    }
}
