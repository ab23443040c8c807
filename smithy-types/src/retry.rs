/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Shared retry vocabulary: the reasons a [`crate::error::ProvideErrorKind`]-implementing
//! error can be classified as retryable, and the directive a retry policy produces for a
//! given attempt outcome. Defined here (rather than in the retry strategy crate) so that
//! protocol and transport error types can implement classification without depending on
//! the retry strategy implementation itself.

use std::fmt;

/// Why an error is being retried, distinguished because each reason costs a different
/// number of tokens when drawn from a [`RetryTokenBucket`](crate) and is exposed to
/// interceptors for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RetryReason {
    /// A transient failure unrelated to server load (connection reset, timeout).
    Transient,
    /// The server explicitly signaled it is being throttled (429, `ThrottlingException`).
    Throttling,
    /// A 5xx-class failure attributable to the server.
    ServerSide,
    /// A 4xx-class failure attributable to the request itself; rarely retryable, but a
    /// policy may still choose to retry specific codes (e.g. 401 after re-signing).
    ClientSide,
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RetryReason::Transient => "transient",
            RetryReason::Throttling => "throttling",
            RetryReason::ServerSide => "server-side",
            RetryReason::ClientSide => "client-side",
        };
        f.write_str(s)
    }
}

/// The directive a [`RetryPolicy`](crate) produces after observing one attempt's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDirective {
    /// The attempt succeeded (or failed in a way the policy accepts); stop retrying.
    TerminateAndSucceed,
    /// The attempt failed in a way the policy will never retry; stop and surface the
    /// error.
    TerminateAndFail,
    /// The attempt failed in a retryable way; try again if attempts remain.
    RetryError(RetryReason),
}

/// Per-reason token costs used by [`StandardRetryTokenBucket`](crate), defined here so
/// error classification and token accounting agree on vocabulary without a dependency
/// cycle between the types crate and the retry strategy crate.
pub fn standard_retry_cost(reason: RetryReason) -> u32 {
    match reason {
        RetryReason::Transient | RetryReason::ServerSide | RetryReason::ClientSide => 5,
        RetryReason::Throttling => 10,
    }
}
