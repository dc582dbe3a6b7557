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

use std::fmt;

use presign_core::hash::{hex_hmac_sha256, hmac_sha256};
use presign_core::time::{format_date, DateTime};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::constants::{AWS4_REQUEST, SERVICE_S3};

/// Credential scope: `20130524/us-east-1/s3/aws4_request`
pub(crate) struct CredentialScope<'a> {
    date: String,
    region: &'a str,
}

impl<'a> CredentialScope<'a> {
    pub fn new(time: DateTime, region: &'a str) -> Self {
        Self {
            date: format_date(time),
            region,
        }
    }
}

impl fmt::Display for CredentialScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{SERVICE_S3}/{AWS4_REQUEST}", self.date, self.region)
    }
}

/// Key derived from the secret access key for one scope.
///
/// The bytes are wiped when the key is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn derive(secret_access_key: &str, scope: &CredentialScope) -> Self {
        let secret = Zeroizing::new(format!("AWS4{secret_access_key}"));
        // Sign date
        let sign_date = Zeroizing::new(hmac_sha256(secret.as_bytes(), scope.date.as_bytes()));
        // Sign region
        let sign_region = Zeroizing::new(hmac_sha256(&sign_date, scope.region.as_bytes()));
        // Sign service
        let sign_service = Zeroizing::new(hmac_sha256(&sign_region, SERVICE_S3.as_bytes()));
        // Sign request
        Self(hmac_sha256(&sign_service, AWS4_REQUEST.as_bytes()))
    }

    /// Hex encoded signature of `string_to_sign`.
    pub fn sign(&self, string_to_sign: &str) -> String {
        hex_hmac_sha256(&self.0, string_to_sign.as_bytes())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(***)")
    }
}
