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
use thiserror::Error;

/// The error type for presign operations
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP method is not one of `GET` or `PUT`
    InvalidMethod,

    /// The object key cannot be represented as a URI path
    MalformedObjectUri,

    /// Access key id, secret access key, region or bucket is empty
    MissingCredentialOrRegion,

    /// An extra header name or value is not valid HTTP
    InvalidHeader,

    /// Configuration error (unreadable or unusable values)
    ConfigInvalid,

    /// Unexpected errors, which indicate a bug rather than bad input
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Check if this error was caused by the caller's input.
    ///
    /// Input errors are deterministic: retrying with the same input yields
    /// the same error.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidMethod
                | ErrorKind::MalformedObjectUri
                | ErrorKind::MissingCredentialOrRegion
                | ErrorKind::InvalidHeader
        )
    }
}

// Convenience constructors
impl Error {
    /// Create an invalid method error
    pub fn invalid_method(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidMethod, message)
    }

    /// Create a malformed object uri error
    pub fn malformed_object_uri(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedObjectUri, message)
    }

    /// Create a missing credential or region error
    pub fn missing_credential_or_region(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingCredentialOrRegion, message)
    }

    /// Create an invalid header error
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidHeader, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidMethod => write!(f, "invalid method"),
            ErrorKind::MalformedObjectUri => write!(f, "malformed object uri"),
            ErrorKind::MissingCredentialOrRegion => write!(f, "missing credential or region"),
            ErrorKind::InvalidHeader => write!(f, "invalid header"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::invalid_header(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::invalid_header(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
