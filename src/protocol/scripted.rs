// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport for unit tests.
//!
//! Replies are queued per endpoint. The last queued reply for an endpoint is
//! repeated once the queue is drained to it, so a single `reply` covers every
//! poll cycle of a test.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::protocol::{Method, Params, RawResponse, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Response(u16, String),
    Fail(String),
}

/// A request seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Recorded {
    pub method: Method,
    pub endpoint: String,
    pub params: Params,
}

#[derive(Debug, Default)]
struct Script {
    replies: HashMap<String, VecDeque<Reply>>,
    delays: HashMap<String, Duration>,
    requests: Vec<Recorded>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, endpoint: &str, status: u16, body: impl Into<String>) {
        self.push(endpoint, Reply::Response(status, body.into()));
    }

    pub fn reply_json(&self, endpoint: &str, body: &Value) {
        self.reply(endpoint, 200, body.to_string());
    }

    pub fn fail(&self, endpoint: &str, message: &str) {
        self.push(endpoint, Reply::Fail(message.to_string()));
    }

    pub fn delay(&self, endpoint: &str, delay: Duration) {
        self.script.lock().delays.insert(endpoint.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.lock().requests.clone()
    }

    pub fn count(&self, method: Method, endpoint: &str) -> usize {
        self.script
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.endpoint == endpoint)
            .count()
    }

    fn push(&self, endpoint: &str, reply: Reply) {
        self.script
            .lock()
            .replies
            .entry(endpoint.to_string())
            .or_default()
            .push_back(reply);
    }

    fn next(&self, method: Method, endpoint: &str, params: &Params) -> (Option<Reply>, Option<Duration>) {
        let mut script = self.script.lock();
        script.requests.push(Recorded {
            method,
            endpoint: endpoint.to_string(),
            params: params.clone(),
        });
        let delay = script.delays.get(endpoint).copied();
        let reply = script.replies.get_mut(endpoint).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });
        (reply, delay)
    }
}

impl Transport for ScriptedTransport {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> Result<RawResponse, ProtocolError> {
        let (reply, delay) = self.next(method, endpoint, params);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Some(Reply::Response(status, body)) => Ok(RawResponse::new(status, body)),
            Some(Reply::Fail(message)) => Err(ProtocolError::connection(endpoint, message)),
            None => Ok(RawResponse::new(404, "")),
        }
    }
}
