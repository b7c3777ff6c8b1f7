// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static registration table and entity discovery.

use super::{EntitySource, EntitySpec, Platform};
use crate::descriptor::DeviceDescriptor;
use crate::types::{ChannelIndex, ChannelKind};

/// Prefix used when the controller does not report a `device_index`.
const UNKNOWN_DEVICE_INDEX: &str = "unknown";

struct Registration {
    kind: ChannelKind,
    platform: Platform,
    id: &'static str,
    label: &'static str,
}

const fn reg(
    kind: ChannelKind,
    platform: Platform,
    id: &'static str,
    label: &'static str,
) -> Registration {
    Registration {
        kind,
        platform,
        id,
        label,
    }
}

/// Indexed channel kinds and the entities they produce. Temperature probes
/// are addressed by 1-Wire address and handled separately.
const REGISTRY: [Registration; 12] = [
    reg(ChannelKind::Relay, Platform::Switch, "relay", "Relay"),
    reg(ChannelKind::Relay, Platform::Button, "relay_impulse", "Relay impulse"),
    reg(ChannelKind::VirtualSwitch, Platform::Switch, "v_switch", "Virtual switch"),
    reg(ChannelKind::Light, Platform::Light, "light", "Light"),
    reg(ChannelKind::VirtualNumeric, Platform::Number, "v_numeric", "Virtual number"),
    reg(ChannelKind::Button, Platform::BinarySensor, "button", "Button"),
    reg(ChannelKind::BinarySensor, Platform::BinarySensor, "binary_sensor", "Binary sensor"),
    reg(
        ChannelKind::VirtualBinarySensor,
        Platform::BinarySensor,
        "v_binary_sensor",
        "Virtual binary sensor",
    ),
    reg(ChannelKind::VirtualButton, Platform::Button, "v_button", "Virtual button"),
    reg(ChannelKind::AnalogIn, Platform::Sensor, "analog_in", "Analog input"),
    reg(ChannelKind::Counter, Platform::Sensor, "counter", "Counter"),
    reg(ChannelKind::Temperature, Platform::Sensor, "ds18b20", "Temperature"),
];

/// Builds the entity catalogue of a controller.
///
/// Entities are listed in registration order, channels in index order.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::DeviceDescriptor;
/// use stmctrl_lib::entity::{discover, Platform};
///
/// let descriptor = DeviceDescriptor::from_json(serde_json::json!({
///     "relay": 1,
///     "device_index": "A7",
/// }))
/// .unwrap();
///
/// let ids: Vec<_> = discover(&descriptor)
///     .iter()
///     .map(|e| e.unique_id().to_string())
///     .collect();
/// assert_eq!(ids, ["a7_relay_1", "a7_relay_impulse_1", "a7_works_since"]);
/// ```
#[must_use]
pub fn discover(descriptor: &DeviceDescriptor) -> Vec<EntitySpec> {
    let prefix = descriptor
        .device_index()
        .unwrap_or_else(|| UNKNOWN_DEVICE_INDEX.to_string());
    let unique_id = |suffix: &str| format!("{prefix}_{suffix}").to_lowercase();

    let mut entities = Vec::new();

    for entry in &REGISTRY {
        if entry.kind == ChannelKind::Temperature {
            for address in descriptor.temperature_addresses() {
                entities.push(EntitySpec {
                    unique_id: unique_id(&format!("{}_{address}", entry.id)),
                    name: format!("{} ({address})", entry.label),
                    platform: entry.platform,
                    source: EntitySource::Temperature {
                        address: address.to_string(),
                    },
                    bounds: None,
                    unit: Some("°C"),
                });
            }
            continue;
        }

        for index in ChannelIndex::up_to(descriptor.count(entry.kind)) {
            let bounds = if entry.platform == Platform::Number {
                descriptor.numeric_bounds(index)
            } else {
                None
            };
            entities.push(EntitySpec {
                unique_id: unique_id(&format!("{}_{index}", entry.id)),
                name: format!("{} {index}", entry.label),
                platform: entry.platform,
                source: EntitySource::Channel {
                    kind: entry.kind,
                    index,
                },
                bounds,
                unit: None,
            });
        }
    }

    entities.push(EntitySpec {
        unique_id: unique_id("works_since"),
        name: "Works since".to_string(),
        platform: Platform::Timestamp,
        source: EntitySource::WorksSince,
        bounds: None,
        unit: None,
    });

    entities
}
