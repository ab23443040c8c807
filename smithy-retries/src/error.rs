/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Errors surfaced by the retry loop and its token bucket.

use smithy_types::error::BoxError;
use std::fmt;

/// Returned when a [`crate::token_bucket::RetryTokenBucket`] operating in circuit mode has
/// no capacity left to grant an attempt. Carries the last observed result (the error the
/// caller was about to retry when capacity ran out), if one is available.
#[derive(Debug)]
pub struct RetryCapacityExceededError {
    last_error: Option<BoxError>,
}

impl RetryCapacityExceededError {
    /// Creates a new error, optionally carrying the last observed failure.
    pub fn new(last_error: Option<BoxError>) -> Self {
        Self { last_error }
    }

    /// The last observed failure, if the bucket was exhausted mid-retry rather than on the
    /// initial attempt.
    pub fn last_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.last_error.as_deref()
    }
}

impl fmt::Display for RetryCapacityExceededError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "retry token bucket has no capacity remaining")
    }
}

impl std::error::Error for RetryCapacityExceededError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error.as_deref().map(|e| e as _)
    }
}

/// Returned when the retry loop has exhausted its configured `max_attempts` without a
/// policy directive of `TerminateAndSucceed`. Carries the last observed error.
#[derive(Debug)]
pub struct TooManyAttemptsError {
    attempts: u32,
    last_error: BoxError,
}

impl TooManyAttemptsError {
    /// Creates a new error reporting how many attempts were made before giving up.
    pub fn new(attempts: u32, last_error: BoxError) -> Self {
        Self { attempts, last_error }
    }

    /// The number of attempts made, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl fmt::Display for TooManyAttemptsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exceeded the maximum number of retry attempts ({})", self.attempts)
    }
}

impl std::error::Error for TooManyAttemptsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.last_error.as_ref() as _)
    }
}
