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

use std::fmt::Write;

use chrono::TimeDelta;
use log::debug;
use presign_core::time::{format_iso8601, DateTime};
use presign_core::{Error, Result};

use crate::canonical::{uri_encode, CanonicalRequest};
use crate::constants::{AWS4_HMAC_SHA256, X_AMZ_SIGNATURE};
use crate::request::SigningRequest;
use crate::scope::{CredentialScope, SigningKey};
use crate::{PresignInput, PresignedUrl, ServiceConfig};

/// Presign a url with AWS SigV4 query authentication.
///
/// - [Authenticating Requests: Using Query Parameters](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html)
///
/// The call is pure: with [`PresignInput::time`] set, the same config and
/// input always produce the same [`PresignedUrl`].
///
/// # Errors
///
/// - [`InvalidMethod`](presign_core::ErrorKind::InvalidMethod) if the method
///   is not `GET` or `PUT`, reported before anything else is checked.
/// - [`MissingCredentialOrRegion`](presign_core::ErrorKind::MissingCredentialOrRegion)
///   if access key id, secret access key, region or bucket is empty.
/// - [`MalformedObjectUri`](presign_core::ErrorKind::MalformedObjectUri) if
///   the key can not be written into a url path.
pub fn sign(config: &ServiceConfig, input: &PresignInput) -> Result<PresignedUrl> {
    let req = SigningRequest::resolve(config, input)?;
    debug!("presigning request: {req:?}");

    let scope = CredentialScope::new(req.time, req.region);
    debug!("calculated scope: {scope}");

    let creq = CanonicalRequest::build(&req, &scope)?;
    debug!("calculated canonical request: {creq}");

    let string_to_sign = string_to_sign(req.time, &scope, &creq.hash())?;
    debug!("calculated string to sign: {string_to_sign}");

    let signature = {
        let key = SigningKey::derive(req.secret_access_key, &scope);
        key.sign(&string_to_sign)
    };

    Ok(PresignedUrl {
        url: build_url(&req, &creq, &signature),
        expires_at: expires_at(req.time, req.expires_in)?,
    })
}

/// StringToSign:
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20220313T072004Z
/// 20220313/<region>/s3/aws4_request
/// <hashed_canonical_request>
/// ```
fn string_to_sign(time: DateTime, scope: &CredentialScope, hashed_creq: &str) -> Result<String> {
    let mut f = String::with_capacity(128);
    writeln!(f, "{AWS4_HMAC_SHA256}")?;
    writeln!(f, "{}", format_iso8601(time))?;
    writeln!(f, "{scope}")?;
    write!(f, "{hashed_creq}")?;
    Ok(f)
}

/// `{protocol}{bucket}.{endpoint}/{key}?{query}&X-Amz-Signature={signature}`
fn build_url(req: &SigningRequest, creq: &CanonicalRequest, signature: &str) -> String {
    let query = creq.query_string();
    let mut url = String::with_capacity(
        req.protocol.len() + req.bucket.len() + req.endpoint.len() + query.len() + 128,
    );

    url.push_str(req.protocol);
    url.push_str(&req.host());
    url.push_str(creq.path());
    url.push('?');
    url.push_str(&query);
    url.push('&');
    url.push_str(&uri_encode(X_AMZ_SIGNATURE));
    url.push('=');
    url.push_str(&uri_encode(signature));
    url
}

fn expires_at(time: DateTime, expires_in: u64) -> Result<DateTime> {
    i64::try_from(expires_in)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|d| time.checked_add_signed(d))
        .ok_or_else(|| {
            Error::config_invalid(format!("expires_in {expires_in} seconds is out of range"))
        })
}
