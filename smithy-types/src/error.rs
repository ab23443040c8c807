/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Shared error vocabulary.

use std::error::Error as StdError;
use std::fmt;

/// A type-erased error, analogous to `anyhow::Error` but without the extra dependency.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The taxonomy of errors that the runtime's components may surface, independent of any
/// particular protocol. Components other than the retry strategy propagate these unchanged;
/// the retry strategy is the only place that interprets [`ErrorKind`] to decide whether to
/// retry (see the `smithy-retries` crate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A transient error, such as a connection reset, that is usually safe to retry.
    TransientError,
    /// The downstream service indicated it is being overwhelmed.
    ThrottlingError,
    /// A 5xx-class error that is not a throttling error.
    ServerError,
    /// A 4xx-class error that is not a throttling error; usually not safe to retry.
    ClientError,
}

/// A marker trait implemented by errors that know how to classify themselves for the
/// retry strategy. Service-generated error types implement this; errors originating from
/// core components (signing, serialization) do not, since they are never retryable.
pub trait ProvideErrorKind {
    /// Returns the retry classification of this error, if the error is able to determine one.
    /// Returning `None` defers the decision to the installed `RetryClassifier`.
    fn retryable_error_kind(&self) -> Option<ErrorKind>;

    /// Returns the modeled error code, if any (e.g. `"ThrottlingException"`).
    fn code(&self) -> Option<&str>;
}

/// Error produced when constructing a value via a builder fails because a required field
/// was never set, or a provided field failed validation.
#[derive(Debug)]
pub struct BuildError {
    message: String,
    source: Option<BoxError>,
}

impl BuildError {
    /// Creates a new `BuildError` with a message and no source.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `BuildError` wrapping a source error.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for BuildError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as _)
    }
}
