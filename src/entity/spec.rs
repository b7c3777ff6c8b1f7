// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity descriptions and value extraction.

use chrono::{DateTime, Utc};

use super::Platform;
use crate::coordinator::CoordinatorData;
use crate::descriptor::NumericBounds;
use crate::types::{ChannelIndex, ChannelKind, ValueKind};

/// Where an entity reads its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitySource {
    /// Position `index` of the `kind` array in the state.
    Channel {
        /// Channel kind.
        kind: ChannelKind,
        /// 1-based channel index.
        index: ChannelIndex,
    },
    /// The temperature probe at `address`.
    Temperature {
        /// 1-Wire address of the probe.
        address: String,
    },
    /// The estimated boot time.
    WorksSince,
}

/// Current value of an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityValue {
    /// On/off state.
    Bool(bool),
    /// Numeric reading.
    Number(f64),
    /// Point in time.
    Timestamp(DateTime<Utc>),
}

/// Description of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub(crate) unique_id: String,
    pub(crate) name: String,
    pub(crate) platform: Platform,
    pub(crate) source: EntitySource,
    pub(crate) bounds: Option<NumericBounds>,
    pub(crate) unit: Option<&'static str>,
}

impl EntitySpec {
    /// Returns the unique id, lowercase and prefixed with the device index.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the platform the entity is registered under.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns where the entity reads its value from.
    #[must_use]
    pub fn source(&self) -> &EntitySource {
        &self.source
    }

    /// Returns the accepted range of a number entity.
    #[must_use]
    pub fn bounds(&self) -> Option<NumericBounds> {
        self.bounds
    }

    /// Returns the step of a number entity.
    #[must_use]
    pub fn step(&self) -> Option<i64> {
        (self.platform == Platform::Number).then_some(1)
    }

    /// Returns the unit of measurement.
    #[must_use]
    pub fn unit(&self) -> Option<&'static str> {
        self.unit
    }

    /// Reads the entity value from a snapshot.
    ///
    /// Returns `None` for buttons, when the kind is missing from the state,
    /// when its array is shorter than the index, or when the value has the
    /// wrong type.
    #[must_use]
    pub fn read(&self, data: &CoordinatorData) -> Option<EntityValue> {
        if !self.platform.has_state() {
            return None;
        }
        match &self.source {
            EntitySource::Channel { kind, index } => match kind.value_kind() {
                ValueKind::Boolean => data
                    .state()
                    .switch_state(*kind, *index)
                    .map(|s| EntityValue::Bool(s.is_on())),
                ValueKind::Numeric | ValueKind::Temperature => data
                    .state()
                    .number(*kind, *index)
                    .map(EntityValue::Number),
                ValueKind::Trigger => None,
            },
            EntitySource::Temperature { address } => {
                data.state().temperature(address).map(EntityValue::Number)
            }
            EntitySource::WorksSince => data.works_since().map(EntityValue::Timestamp),
        }
    }
}
