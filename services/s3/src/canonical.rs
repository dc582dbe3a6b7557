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

//! Canonical request of SigV4 query authentication.
//!
//! ```text
//! GET
//! /test.txt
//! X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Credential=...&X-Amz-SignedHeaders=host
//! host:examplebucket.s3.amazonaws.com
//!
//! host
//! UNSIGNED-PAYLOAD
//! ```

use std::collections::BTreeMap;
use std::fmt;

use http::header::HOST;
use http::{HeaderName, HeaderValue, Method};
use percent_encoding::utf8_percent_encode;
use presign_core::hash::hex_sha256;
use presign_core::time::format_iso8601;
use presign_core::{Error, Result};

use crate::constants::*;
use crate::request::SigningRequest;
use crate::scope::CredentialScope;

/// Encode a query name or value.
///
/// Every byte except `A-Z a-z 0-9 - . _ ~` becomes `%XX` with uppercase hex.
/// The canonical request and the final url must both go through here.
pub fn uri_encode(s: &str) -> String {
    utf8_percent_encode(s, &AWS_QUERY_ENCODE_SET).to_string()
}

/// Check that the key can be written into a url path verbatim.
///
/// Only RFC 3986 `pchar` and `/` are accepted: unreserved characters,
/// sub-delims, `:`, `@` and well formed `%XX` escapes.
pub(crate) fn check_object_key(key: &str) -> Result<()> {
    let bs = key.as_bytes();
    let mut idx = 0;
    while idx < bs.len() {
        let b = bs[idx];
        if b == b'%' {
            let escaped = bs.get(idx + 1..idx + 3);
            if !escaped.is_some_and(|v| v.iter().all(u8::is_ascii_hexdigit)) {
                return Err(Error::malformed_object_uri(format!(
                    "object key {key:?} has an invalid percent escape at byte {idx}"
                )));
            }
            idx += 3;
            continue;
        }

        if !is_path_char(b) {
            return Err(Error::malformed_object_uri(format!(
                "object key {key:?} contains {:?} at byte {idx}, not allowed in a url path",
                char::from(b)
            )));
        }
        idx += 1;
    }
    Ok(())
}

fn is_path_char(b: u8) -> bool {
    // unreserved
    b.is_ascii_alphanumeric()
        || matches!(b, b'-' | b'.' | b'_' | b'~')
        // sub-delims
        || matches!(b, b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=')
        || matches!(b, b':' | b'@' | b'/')
}

/// Canonical form of a presign request.
///
/// Query pairs and headers are sorted exactly once, here, and every later
/// rendering iterates them in that order.
pub(crate) struct CanonicalRequest<'a> {
    method: &'a Method,
    /// `/` + object key
    path: String,
    /// Encoded and sorted query pairs, excluding `X-Amz-SignedHeaders`.
    query: Vec<(String, String)>,
    /// Lowercase header name to trimmed value.
    headers: BTreeMap<String, String>,
}

impl<'a> CanonicalRequest<'a> {
    pub fn build(req: &SigningRequest<'a>, scope: &CredentialScope) -> Result<Self> {
        check_object_key(req.key)?;

        let headers = canonicalize_headers(req)?;
        let query = canonicalize_query(req, scope);

        Ok(Self {
            method: req.method,
            path: format!("/{}", req.key),
            query,
            headers,
        })
    }

    /// Path of the url, `/` + key.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sorted header names joined by `;`, like `host;x-amz-acl`.
    pub fn signed_headers(&self) -> String {
        self.headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Query string shared by the canonical request and the url.
    ///
    /// `X-Amz-SignedHeaders` is always the last pair.
    pub fn query_string(&self) -> String {
        let mut s = String::with_capacity(256);
        for (k, v) in &self.query {
            s.push_str(k);
            s.push('=');
            s.push_str(v);
            s.push('&');
        }
        s.push_str(&uri_encode(X_AMZ_SIGNED_HEADERS));
        s.push('=');
        s.push_str(&uri_encode(&self.signed_headers()));
        s
    }

    /// Hex encoded SHA256 of the canonical request.
    pub fn hash(&self) -> String {
        hex_sha256(self.to_string().as_bytes())
    }
}

impl fmt::Display for CanonicalRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.path)?;
        writeln!(f, "{}", self.query_string())?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}:{value}")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.signed_headers())?;
        write!(f, "{UNSIGNED_PAYLOAD}")
    }
}

fn canonicalize_headers(req: &SigningRequest) -> Result<BTreeMap<String, String>> {
    let mut headers = BTreeMap::new();
    for (name, value) in req.headers {
        // HeaderName lowercases the name for us.
        let name = HeaderName::from_bytes(name.trim().as_bytes())?;
        let value = value.trim();
        HeaderValue::from_str(value)?;

        // Repeated names are signed as one header with comma joined values.
        headers
            .entry(name.as_str().to_string())
            .and_modify(|v: &mut String| {
                v.push(',');
                v.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    // Host is always signed and always points at the bucket.
    let host = req.host();
    HeaderValue::from_str(&host)?;
    headers.insert(HOST.as_str().to_string(), host);

    Ok(headers)
}

fn canonicalize_query(req: &SigningRequest, scope: &CredentialScope) -> Vec<(String, String)> {
    let mut query = vec![
        (X_AMZ_ALGORITHM, AWS4_HMAC_SHA256.to_string()),
        (X_AMZ_CREDENTIAL, format!("{}/{}", req.access_key_id, scope)),
        (X_AMZ_DATE, format_iso8601(req.time)),
        (X_AMZ_EXPIRES, req.expires_in.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (uri_encode(k), uri_encode(&v)))
    .collect::<Vec<_>>();

    // Sort by encoded param name.
    query.sort();
    query
}
