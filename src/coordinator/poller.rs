// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background poll task.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::Coordinator;
use crate::protocol::Transport;

/// Handle to a running poll task.
///
/// The task refreshes the coordinator every `update_interval`, starting
/// immediately. Dropping the handle stops the task; [`Poller::shutdown`]
/// also waits for it to finish.
#[derive(Debug)]
pub struct Poller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub(crate) fn spawn<T: Transport>(coordinator: Coordinator<T>) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(coordinator, cancel.clone()));
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Returns `true` while the task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the task and waits for it to exit.
    ///
    /// An in-flight cycle is abandoned.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Poll task ended abnormally");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_task<T: Transport>(coordinator: Coordinator<T>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(coordinator.config().update_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(address = %coordinator.address(), "Poll task started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    // Failures are logged and published by the cycle itself
                    _ = coordinator.refresh() => {}
                }
            }
        }
    }

    tracing::debug!(address = %coordinator.address(), "Poll task stopped");
}
