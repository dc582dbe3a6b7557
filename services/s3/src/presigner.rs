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

use http::Method;
use presign_core::{Error, Result};

use crate::{sign, PresignInput, PresignedUrl, ServiceConfig};

/// Presigner hands out urls for objects in the configured bucket.
///
/// It only owns its config: clone it or share it behind an `Arc` wherever
/// urls are needed.
#[derive(Debug, Clone)]
pub struct Presigner {
    config: ServiceConfig,
}

impl Presigner {
    /// Create a new presigner with given config.
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Get the config in use.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Presign `path` for `method`, which is `get` or `put` in any case.
    ///
    /// A leading `/` in `path` is ignored. `expires_in` at or below 10
    /// seconds falls back to 1800 seconds.
    pub fn presign(&self, method: &str, path: &str, expires_in: u64) -> Result<PresignedUrl> {
        let method = parse_method(method)?;
        let key = path.strip_prefix('/').unwrap_or(path);

        self.presign_input(&PresignInput::new(method, key).with_expires_in(expires_in))
    }

    /// Presign a download url.
    pub fn presign_get(&self, path: &str, expires_in: u64) -> Result<PresignedUrl> {
        self.presign("get", path, expires_in)
    }

    /// Presign an upload url.
    pub fn presign_put(&self, path: &str, expires_in: u64) -> Result<PresignedUrl> {
        self.presign("put", path, expires_in)
    }

    /// Presign with full control over the input.
    pub fn presign_input(&self, input: &PresignInput) -> Result<PresignedUrl> {
        sign(&self.config, input)
    }
}

fn parse_method(method: &str) -> Result<Method> {
    if method.eq_ignore_ascii_case("get") {
        Ok(Method::GET)
    } else if method.eq_ignore_ascii_case("put") {
        Ok(Method::PUT)
    } else {
        Err(Error::invalid_method(format!(
            "method {method:?} is not supported, expect get or put"
        )))
    }
}
