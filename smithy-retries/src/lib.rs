/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Retry strategy for operation execution: a token bucket that rations attempts, an
//! adaptive client-side rate limiter that learns a safe send rate from throttling
//! signals, and the retry loop itself.

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod client_rate_limiter;
pub mod error;
pub mod retry;
pub mod token_bucket;

pub use client_rate_limiter::AdaptiveClientRateLimiter;
pub use error::{RetryCapacityExceededError, TooManyAttemptsError};
pub use retry::{retry, ExponentialBackoffWithJitter, RetryPolicy, RetryToken};
pub use token_bucket::{InfiniteTokenBucket, RetryTokenBucket, StandardRetryTokenBucket};
