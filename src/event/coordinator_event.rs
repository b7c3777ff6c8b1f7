// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator event types.

use std::sync::Arc;

use crate::coordinator::{CoordinatorData, Reboot};
use crate::error::UpdateFailed;
use crate::types::ChannelKind;

/// Events emitted by a coordinator.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// A cycle succeeded and a new snapshot was published.
    Updated(Arc<CoordinatorData>),

    /// A cycle failed. The previous snapshot is still current.
    UpdateFailed(UpdateFailed),

    /// The device uptime went backwards.
    RebootDetected(Reboot),

    /// Replaying cached values after a reboot failed for one channel kind.
    ReconcileFailed {
        /// The channel kind whose write failed.
        kind: ChannelKind,
        /// The rendered error.
        error: String,
    },

    /// The device became available or unavailable.
    AvailabilityChanged {
        /// The new availability.
        available: bool,
    },
}

impl CoordinatorEvent {
    /// Returns a short name for the event, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Updated(_) => "updated",
            Self::UpdateFailed(_) => "update_failed",
            Self::RebootDetected(_) => "reboot_detected",
            Self::ReconcileFailed { .. } => "reconcile_failed",
            Self::AvailabilityChanged { .. } => "availability_changed",
        }
    }

    /// Returns `true` for events that report a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::UpdateFailed(_) | Self::ReconcileFailed { .. })
    }
}
