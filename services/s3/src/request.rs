// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt::{Debug, Formatter};

use chrono::SubsecRound;
use http::Method;
use presign_core::time::{now, DateTime};
use presign_core::utils::Redact;
use presign_core::{Error, Result};

use crate::config::{check_bucket, check_endpoint, check_not_empty, check_protocol};
use crate::constants::{DEFAULT_EXPIRES_IN_SECS, MIN_EXPIRES_IN_SECS};
use crate::ServiceConfig;

/// Input of a single presign call.
#[derive(Debug, Clone)]
pub struct PresignInput {
    /// Object key, written into the url path as is.
    pub key: String,
    /// HTTP method the url grants, only `GET` and `PUT` are accepted.
    pub method: Method,
    /// Requested lifetime of the url in seconds.
    ///
    /// Values at or below 10 seconds are replaced by 1800 seconds.
    pub expires_in: u64,
    /// Extra headers to sign besides `host`.
    ///
    /// The holder of the url must send these headers with the same values.
    pub headers: Vec<(String, String)>,
    /// Signing time, the current time is used if not set.
    pub time: Option<DateTime>,
    /// Bucket overriding [`ServiceConfig::bucket`].
    pub bucket: Option<String>,
    /// Protocol overriding [`ServiceConfig::protocol`].
    pub protocol: Option<String>,
    /// Endpoint overriding [`ServiceConfig::endpoint`].
    pub endpoint: Option<String>,
}

impl PresignInput {
    /// Create a new input for given method and key.
    pub fn new(method: Method, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            method,
            expires_in: DEFAULT_EXPIRES_IN_SECS,
            headers: Vec::new(),
            time: None,
            bucket: None,
            protocol: None,
            endpoint: None,
        }
    }

    /// Input for a download url.
    pub fn get(key: impl Into<String>) -> Self {
        Self::new(Method::GET, key)
    }

    /// Input for an upload url.
    pub fn put(key: impl Into<String>) -> Self {
        Self::new(Method::PUT, key)
    }

    /// Set the requested expiry in seconds.
    pub fn with_expires_in(mut self, secs: u64) -> Self {
        self.expires_in = secs;
        self
    }

    /// Add an extra header to sign.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// Urls should be signed with the current time. Fixing the time is
    /// meant for reproducible output in tests.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Override the bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Override the protocol.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Override the endpoint host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// A signed url together with the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The full url, including the signature.
    pub url: String,
    /// Signing time plus the effective expiry.
    pub expires_at: DateTime,
}

/// Everything one signing call needs, with config and input merged and the
/// timestamp fixed.
pub(crate) struct SigningRequest<'a> {
    pub method: &'a Method,
    pub bucket: &'a str,
    pub key: &'a str,
    pub region: &'a str,
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub expires_in: u64,
    pub headers: &'a [(String, String)],
    pub time: DateTime,
    pub protocol: &'a str,
    pub endpoint: &'a str,
}

impl<'a> SigningRequest<'a> {
    /// Merge config and input.
    ///
    /// The method is checked before anything else.
    pub fn resolve(config: &'a ServiceConfig, input: &'a PresignInput) -> Result<Self> {
        check_method(&input.method)?;

        let bucket = input.bucket.as_deref().unwrap_or(config.bucket.as_str());
        check_not_empty("access_key_id", &config.access_key_id)?;
        check_not_empty("secret_access_key", &config.secret_access_key)?;
        check_not_empty("region", &config.region)?;
        check_not_empty("bucket", bucket)?;
        check_bucket(bucket)?;

        let protocol = input.protocol.as_deref().unwrap_or(config.protocol.as_str());
        check_protocol(protocol)?;
        let endpoint = input.endpoint.as_deref().unwrap_or(config.endpoint.as_str());
        check_endpoint(endpoint)?;

        Ok(Self {
            method: &input.method,
            bucket,
            key: &input.key,
            region: &config.region,
            access_key_id: &config.access_key_id,
            secret_access_key: &config.secret_access_key,
            expires_in: effective_expires_in(input.expires_in),
            headers: &input.headers,
            // Signed timestamps have no sub-second part.
            time: input.time.map_or_else(now, |t| t.trunc_subsecs(0)),
            protocol,
            endpoint,
        })
    }

    /// Value of the `host` header: `{bucket}.{endpoint}`.
    pub fn host(&self) -> String {
        format!("{}.{}", self.bucket, self.endpoint)
    }
}

impl Debug for SigningRequest<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningRequest")
            .field("method", self.method)
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("region", &self.region)
            .field("access_key_id", &Redact::from(self.access_key_id))
            .field("secret_access_key", &Redact::from(self.secret_access_key))
            .field("expires_in", &self.expires_in)
            .field("headers", &self.headers)
            .field("time", &self.time)
            .field("protocol", &self.protocol)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Only `GET` and `PUT` can be presigned.
pub(crate) fn check_method(method: &Method) -> Result<()> {
    if *method == Method::GET || *method == Method::PUT {
        return Ok(());
    }
    Err(Error::invalid_method(format!(
        "method {method} is not supported, only GET and PUT can be presigned"
    )))
}

/// Expiry that will actually be signed.
pub(crate) fn effective_expires_in(secs: u64) -> u64 {
    if secs <= MIN_EXPIRES_IN_SECS {
        DEFAULT_EXPIRES_IN_SECS
    } else {
        secs
    }
}
