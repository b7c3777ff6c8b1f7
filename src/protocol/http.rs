// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the controller.

use std::net::Ipv4Addr;
use std::time::Duration;

use reqwest::Client;

use crate::error::ProtocolError;
use crate::protocol::{Method, Params, RawResponse, Transport, parse_address};

// ============================================================================
// HttpConfig
// ============================================================================

/// Connection parameters for one controller.
///
/// Each request is independent; there is no persistent session.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.100")
///     .with_port(8080)
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.base_url(), "http://192.168.1.100:8080");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    address: String,
    port: u16,
    timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the controller at `address`.
    ///
    /// The address is validated when the client is built.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-request timeout enforced by the HTTP client.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured address string.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.port == Self::DEFAULT_PORT {
            format!("http://{}", self.address)
        } else {
            format!("http://{}:{}", self.address, self.port)
        }
    }

    /// Creates an [`HttpClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] if the address is not a
    /// dotted-quad IPv4 address, or [`ProtocolError::Connection`] if the
    /// underlying HTTP client cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        let address = parse_address(&self.address)?;
        let base_url = self.base_url();

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProtocolError::connection("", e))?;

        Ok(HttpClient {
            address,
            base_url,
            client,
        })
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// reqwest-backed [`Transport`] for one controller.
///
/// Parameters are URL-encoded into the query string for both `GET` and
/// `POST`, which is what the controller firmware reads.
#[derive(Debug, Clone)]
pub struct HttpClient {
    address: Ipv4Addr,
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Creates a client for `address` on port 80 with default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] for malformed addresses.
    pub fn new(address: impl Into<String>) -> Result<Self, ProtocolError> {
        HttpConfig::new(address).into_client()
    }

    /// Returns the validated controller address.
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Returns the base URL of the controller.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for a request.
    fn build_url(&self, endpoint: &str, params: &Params) -> String {
        if params.is_empty() {
            format!("{}/{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}?{}", self.base_url, params.encode())
        }
    }
}

impl Transport for HttpClient {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> Result<RawResponse, ProtocolError> {
        let url = self.build_url(endpoint, params);

        tracing::debug!(%method, url = %url, "Sending HTTP request");

        let request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ProtocolError::connection(endpoint, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProtocolError::connection(endpoint, e))?;

        tracing::debug!(status, body = %body, "Received HTTP response");

        Ok(RawResponse::new(status, body))
    }
}
