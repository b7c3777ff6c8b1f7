// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Published snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::descriptor::DeviceDescriptor;
use crate::state::DeviceState;

/// Result of one successful poll cycle.
///
/// Snapshots are immutable and shared through `Arc`; a later cycle replaces
/// the whole snapshot rather than mutating it.
#[derive(Debug, Clone)]
pub struct CoordinatorData {
    pub(crate) descriptor: Arc<DeviceDescriptor>,
    pub(crate) state: Arc<DeviceState>,
    pub(crate) works_since: Option<DateTime<Utc>>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl CoordinatorData {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(
        descriptor: Arc<DeviceDescriptor>,
        state: Arc<DeviceState>,
        works_since: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            descriptor,
            state,
            works_since,
            updated_at,
        }
    }

    /// Returns the capability descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    /// Returns the device state.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Returns the estimated boot time, if the device reports its uptime.
    #[must_use]
    pub fn works_since(&self) -> Option<DateTime<Utc>> {
        self.works_since
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
