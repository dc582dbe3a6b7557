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

use log::debug;
use presign_core::utils::Redact;
use presign_core::{Env, Error, Result};
use serde::Deserialize;

use crate::constants::*;

/// Config for presigning urls against an S3 compatible service.
///
/// The config is a plain value: build it once, then hand it (or a
/// [`Presigner`](crate::Presigner) owning it) to whoever needs to sign.
///
/// Fields missing from a deserialized config keep their [`Default`] value.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Region of the bucket, for example `us-east-1`.
    pub region: String,
    /// Access key id used in `X-Amz-Credential`.
    pub access_key_id: String,
    /// Secret access key that roots the signing key.
    pub secret_access_key: String,
    /// Bucket used when the input does not name one.
    pub bucket: String,
    /// Scheme prefix of the url, including `://`.
    pub protocol: String,
    /// Service endpoint host, the bucket is prepended to it.
    pub endpoint: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            bucket: String::new(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Debug for ServiceConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("region", &self.region)
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("bucket", &self.bucket)
            .field("protocol", &self.protocol)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ServiceConfig {
    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set access key id and secret access key.
    pub fn with_credential(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.secret_access_key = secret_access_key.into();
        self
    }

    /// Set the default bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set the protocol, like `http://`.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Set the endpoint host, like `s3.us-west-2.amazonaws.com`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overlay values found in env.
    ///
    /// Variables that are unset or empty leave the current value untouched.
    /// `AWS_REGION` takes precedence over `AWS_DEFAULT_REGION`.
    pub fn from_env(mut self, env: &impl Env) -> Self {
        let var = |key: &str| env.var(key).filter(|v| !v.is_empty());

        if let Some(v) = var(AWS_ACCESS_KEY_ID) {
            self.access_key_id = v;
        }
        if let Some(v) = var(AWS_SECRET_ACCESS_KEY) {
            self.secret_access_key = v;
        }
        if let Some(v) = var(AWS_REGION).or_else(|| var(AWS_DEFAULT_REGION)) {
            self.region = v;
        }
        if let Some(v) = var(AWS_S3_BUCKET) {
            self.bucket = v;
        }
        if let Some(v) = var(AWS_S3_ENDPOINT) {
            self.endpoint = v;
        }
        if let Some(v) = var(AWS_S3_PROTOCOL) {
            self.protocol = v;
        }

        debug!("loaded config from env: {self:?}");
        self
    }

    /// Check that the config can be used for signing.
    ///
    /// Bucket is checked at signing time instead, since the input may
    /// override it.
    pub fn validate(&self) -> Result<()> {
        check_not_empty("access_key_id", &self.access_key_id)?;
        check_not_empty("secret_access_key", &self.secret_access_key)?;
        check_not_empty("region", &self.region)?;

        if !self.bucket.is_empty() {
            check_bucket(&self.bucket)?;
        }

        check_protocol(&self.protocol)?;
        check_endpoint(&self.endpoint)
    }
}

pub(crate) fn check_not_empty(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::missing_credential_or_region(format!("{name} is empty")));
    }
    Ok(())
}

pub(crate) fn check_protocol(protocol: &str) -> Result<()> {
    let valid = protocol.strip_suffix("://").is_some_and(|scheme| {
        !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic())
    });
    if !valid {
        return Err(Error::config_invalid(format!(
            "protocol {protocol:?} must look like \"https://\""
        )));
    }
    Ok(())
}

pub(crate) fn check_endpoint(endpoint: &str) -> Result<()> {
    let valid = !endpoint.is_empty() && endpoint.bytes().all(|b| is_host_char(b) || b == b':');
    if !valid {
        return Err(Error::config_invalid(format!(
            "endpoint {endpoint:?} must be a bare host with optional port"
        )));
    }
    Ok(())
}

/// Bucket becomes the first label of the url host, so it must not carry
/// anything that ends or moves the authority.
pub(crate) fn check_bucket(bucket: &str) -> Result<()> {
    if !bucket.bytes().all(is_host_char) {
        return Err(Error::config_invalid(format!(
            "bucket {bucket:?} can not be used as a host label"
        )));
    }
    Ok(())
}

fn is_host_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_')
}
