// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reboot detection from the device uptime counter.
//!
//! The controller reports seconds since boot in `up`. The counter only
//! grows while the device runs, so a smaller value than the previous one
//! means the device restarted in between.

use chrono::{DateTime, TimeDelta, Utc};

/// A detected device restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reboot {
    /// Uptime reported by the previous successful cycle.
    pub previous_uptime: u64,
    /// Uptime reported after the restart.
    pub uptime: u64,
    /// Recomputed boot time.
    pub works_since: DateTime<Utc>,
}

/// Tracks the boot time of a device across poll cycles.
#[derive(Debug, Clone, Default)]
pub struct UptimeTracker {
    works_since: Option<DateTime<Utc>>,
    last_uptime: Option<u64>,
    reboots: u64,
    last_reboot_at: Option<DateTime<Utc>>,
}

impl UptimeTracker {
    /// Creates a tracker that has not seen any uptime yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an uptime observed at `now`.
    ///
    /// `works_since` is computed on the first observation and recomputed
    /// when the uptime decreases; in that case the restart is returned.
    pub fn observe(&mut self, uptime: u64, now: DateTime<Utc>) -> Option<Reboot> {
        let reboot = self
            .last_uptime
            .filter(|previous| uptime < *previous)
            .map(|previous_uptime| Reboot {
                previous_uptime,
                uptime,
                works_since: boot_time(now, uptime),
            });

        if self.works_since.is_none() || reboot.is_some() {
            self.works_since = Some(boot_time(now, uptime));
        }
        if reboot.is_some() {
            self.reboots += 1;
            self.last_reboot_at = Some(now);
        }
        self.last_uptime = Some(uptime);

        reboot
    }

    /// Returns the estimated boot time.
    #[must_use]
    pub fn works_since(&self) -> Option<DateTime<Utc>> {
        self.works_since
    }

    /// Returns the last observed uptime in seconds.
    #[must_use]
    pub fn last_uptime(&self) -> Option<u64> {
        self.last_uptime
    }

    /// Returns the number of detected restarts.
    #[must_use]
    pub fn reboot_count(&self) -> u64 {
        self.reboots
    }

    /// Returns when the last restart was detected.
    #[must_use]
    pub fn last_reboot_at(&self) -> Option<DateTime<Utc>> {
        self.last_reboot_at
    }
}

fn boot_time(now: DateTime<Utc>, uptime: u64) -> DateTime<Utc> {
    i64::try_from(uptime)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|up| now.checked_sub_signed(up))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
