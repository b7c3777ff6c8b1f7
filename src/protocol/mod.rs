// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport layer for talking to the controller.
//!
//! The controller speaks plain HTTP: `GET /system_info`, `GET /state` and
//! `POST /<kind>` with `<index>=<value>` parameters. This module defines the
//! [`Transport`] seam the rest of the library calls, plus the reqwest-based
//! [`HttpClient`] implementation.
//!
//! A transport only moves bytes. Status interpretation and JSON decoding live
//! in [`DeviceClient`](crate::DeviceClient).

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig};

#[cfg(test)]
pub(crate) mod scripted;

use std::fmt;
use std::future::Future;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{ParseError, ProtocolError};

/// HTTP verbs understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read-only query.
    Get,
    /// State-changing command.
    Post,
}

impl Method {
    /// Returns the verb as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(ProtocolError::InvalidMethod(s.to_string())),
        }
    }
}

/// Ordered request parameters, sent URL-encoded in the query string.
///
/// # Examples
///
/// ```
/// use stmctrl_lib::protocol::Params;
///
/// let params = Params::from([("1", "0"), ("2", "1")]);
/// assert_eq!(params.encode(), "1=0&2=1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Encodes the parameters as `k1=v1&k2=v2`.
    #[must_use]
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("{}")
        } else {
            f.write_str(&self.encode())
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Raw response from the controller.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: u16,
    body: String,
}

impl RawResponse {
    /// Creates a new response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parses the body as a specific type.
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be parsed into the target type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

/// Trait for transports that can deliver requests to one controller.
///
/// Implementations report transport-level faults as
/// [`ProtocolError::Connection`] and return every HTTP response, whatever its
/// status, as a [`RawResponse`].
pub trait Transport: Send + Sync + 'static {
    /// Sends one request to `/<endpoint>`.
    fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> impl Future<Output = Result<RawResponse, ProtocolError>> + Send;
}

/// Parses a dotted-quad IPv4 address.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidAddress`] for anything that is not exactly
/// four decimal octets.
pub fn parse_address(address: &str) -> Result<Ipv4Addr, ProtocolError> {
    address
        .parse::<Ipv4Addr>()
        .map_err(|_| ProtocolError::InvalidAddress(address.to_string()))
}
