// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request/response client for one controller.
//!
//! [`DeviceClient`] turns transport responses into JSON values: any status
//! other than 200 becomes [`ProtocolError::Api`], and the body is parsed as a
//! generic JSON value without schema validation. There are no retries at
//! this layer.
//!
//! ```no_run
//! use stmctrl_lib::DeviceClient;
//!
//! # async fn example() -> stmctrl_lib::Result<()> {
//! let client = DeviceClient::http("192.168.1.100")?;
//!
//! let descriptor = client.fetch_capabilities().await?;
//! let state = client.fetch_state().await?;
//! println!("{} relays, up {:?}", descriptor.count(stmctrl_lib::types::ChannelKind::Relay), state.uptime());
//! # Ok(())
//! # }
//! ```

use std::net::Ipv4Addr;

use serde_json::Value;

use crate::command::Command;
use crate::descriptor::DeviceDescriptor;
use crate::error::{Error, ProtocolError};
use crate::protocol::{Method, Params, Transport, parse_address};
use crate::state::DeviceState;

#[cfg(feature = "http")]
use crate::protocol::{HttpClient, HttpConfig};

/// Endpoint serving the capability descriptor.
pub const SYSTEM_INFO_ENDPOINT: &str = "system_info";
/// Endpoint serving the live state.
pub const STATE_ENDPOINT: &str = "state";

/// Client for a single controller.
#[derive(Debug, Clone)]
pub struct DeviceClient<T: Transport> {
    address: Ipv4Addr,
    transport: T,
}

#[cfg(feature = "http")]
impl DeviceClient<HttpClient> {
    /// Creates an HTTP client for the controller at `address`, port 80.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] if `address` is not a
    /// dotted-quad IPv4 address.
    pub fn http(address: &str) -> Result<Self, Error> {
        Self::http_config(HttpConfig::new(address))
    }

    /// Creates an HTTP client from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the address is invalid or the HTTP client cannot be
    /// built.
    pub fn http_config(config: HttpConfig) -> Result<Self, Error> {
        let transport = config.into_client()?;
        Ok(Self {
            address: transport.address(),
            transport,
        })
    }
}

impl<T: Transport> DeviceClient<T> {
    /// Creates a client over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] for malformed addresses.
    pub fn with_transport(address: &str, transport: T) -> Result<Self, Error> {
        let address = parse_address(address)?;
        Ok(Self { address, transport })
    }

    /// Returns the controller address.
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issues a request and returns the JSON body.
    ///
    /// `method` must be exactly `"GET"` or `"POST"`; anything else fails
    /// before a request is sent.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidMethod`] for unsupported verbs
    /// - [`ProtocolError::Api`] for non-200 responses
    /// - [`ProtocolError::Connection`] if the controller is unreachable
    /// - [`ParseError::Json`](crate::error::ParseError::Json) if the body is not JSON
    pub async fn request(
        &self,
        endpoint: &str,
        method: &str,
        params: Option<&Params>,
    ) -> Result<Value, Error> {
        let method: Method = method.parse()?;
        let empty = Params::new();
        self.execute(method, endpoint, params.unwrap_or(&empty))
            .await
    }

    async fn execute(&self, method: Method, endpoint: &str, params: &Params) -> Result<Value, Error> {
        let response = self.transport.send(method, endpoint, params).await?;

        if response.status() != 200 {
            tracing::debug!(
                address = %self.address,
                endpoint,
                status = response.status(),
                "Controller rejected request"
            );
            return Err(ProtocolError::Api {
                endpoint: endpoint.to_string(),
                params: params.to_string(),
                status: response.status(),
            }
            .into());
        }

        Ok(response.parse::<Value>()?)
    }

    /// Fetches the capability descriptor (`GET /system_info`).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a JSON object.
    pub async fn fetch_capabilities(&self) -> Result<DeviceDescriptor, Error> {
        let body = self
            .execute(Method::Get, SYSTEM_INFO_ENDPOINT, &Params::new())
            .await?;
        Ok(DeviceDescriptor::from_json(body)?)
    }

    /// Fetches the live state (`GET /state`).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a valid state
    /// object.
    pub async fn fetch_state(&self) -> Result<DeviceState, Error> {
        let body = self
            .execute(Method::Get, STATE_ENDPOINT, &Params::new())
            .await?;
        Ok(DeviceState::from_json(body)?)
    }

    /// Fetches the firmware version, 0 if the controller does not report one.
    ///
    /// # Errors
    ///
    /// Returns error if the descriptor cannot be fetched.
    pub async fn fetch_version(&self) -> Result<u32, Error> {
        Ok(self.fetch_capabilities().await?.version())
    }

    /// Sends a command (`POST /<endpoint>`).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn send<C: Command + Sync>(&self, command: &C) -> Result<Value, Error> {
        let params = command.params();
        tracing::debug!(
            address = %self.address,
            endpoint = command.endpoint(),
            params = %params,
            "Sending command"
        );
        self.execute(Method::Post, command.endpoint(), &params)
            .await
    }
}
