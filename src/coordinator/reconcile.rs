// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Replaying cached channel values onto a restarted device.
//!
//! After a reboot the controller comes up with default outputs. Every
//! writable kind found in the last snapshot taken before the restart is
//! written back in a single `POST /<kind>` carrying all its channels.

use serde_json::Value;

use crate::command::{ChannelCommand, CommandValue};
use crate::device::DeviceClient;
use crate::event::{CoordinatorEvent, EventBus};
use crate::protocol::Transport;
use crate::state::DeviceState;
use crate::types::{ChannelIndex, ChannelKind, SwitchState};

/// Builds one command per writable kind present in `previous`.
///
/// Values that cannot be expressed for their kind (nulls, strings) are
/// skipped; a kind with nothing left to send yields no command.
pub(crate) fn plan(previous: &DeviceState) -> Vec<ChannelCommand> {
    ChannelKind::RECONCILED
        .into_iter()
        .filter_map(|kind| {
            let values = previous.values(kind)?;
            let mut command = ChannelCommand::new(kind);
            for (index, value) in ChannelIndex::up_to(u32::try_from(values.len()).unwrap_or(u32::MAX))
                .zip(values)
            {
                if let Some(value) = command_value(kind, value) {
                    command.push(index, value);
                }
            }
            (!command.is_empty()).then_some(command)
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn command_value(kind: ChannelKind, value: &Value) -> Option<CommandValue> {
    if kind == ChannelKind::VirtualNumeric {
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|v| v.round() as i64))
            .map(CommandValue::Number)
    } else {
        SwitchState::from_raw(value).map(CommandValue::Switch)
    }
}

/// Sends every planned command. Failures are logged and published, never
/// returned.
pub(crate) async fn replay<T: Transport>(
    client: &DeviceClient<T>,
    previous: &DeviceState,
    events: &EventBus,
) {
    for command in plan(previous) {
        let kind = command.kind();
        match client.send(&command).await {
            Ok(_) => {
                tracing::debug!(address = %client.address(), %kind, "Restored channel values");
            }
            Err(e) => {
                tracing::warn!(
                    address = %client.address(),
                    %kind,
                    error = %e,
                    "Failed to restore channel values after reboot"
                );
                events.publish(CoordinatorEvent::ReconcileFailed {
                    kind,
                    error: e.to_string(),
                });
            }
        }
    }
}
