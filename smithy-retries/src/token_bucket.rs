/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Token buckets that ration retry attempts.
//!
//! Unlike [`crate::client_rate_limiter::AdaptiveClientRateLimiter`] (which learns a send
//! *rate* from throttling signals), a [`RetryTokenBucket`] holds a fixed-size pool of
//! integer capacity that refills at a constant rate over time and is spent per attempt:
//! nothing for the first try, a flat cost for an ordinary retry, a higher cost for a retry
//! that followed a timeout or a throttling response. This bounds how hard a single caller
//! will hammer a downstream service during an outage, independent of the adaptive limiter.

use smithy_types::retry::RetryReason;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::RetryCapacityExceededError;

/// The maximum capacity a [`StandardRetryTokenBucket`] will ever hold, matching the
/// default AWS SDK retry configuration across languages.
pub const DEFAULT_CAPACITY: u32 = 500;
/// Cost of a plain retry (classified `Transient` or `ClientSide`).
pub const DEFAULT_RETRY_COST: u32 = 5;
/// Cost of a retry that followed a timeout or a throttling response.
pub const DEFAULT_TIMEOUT_RETRY_COST: u32 = 10;
/// Capacity credited back to the bucket after a successful attempt.
pub const DEFAULT_SUCCESS_INCREMENT: u32 = 1;
/// Capacity charged for the very first attempt of an operation (not a retry).
pub const INITIAL_TRY_COST: u32 = 0;

/// Common behavior of a retry token bucket: acquire capacity for an attempt, and credit
/// capacity back on success.
pub trait RetryTokenBucket: fmt::Debug + Send + Sync {
    /// Attempts to acquire capacity for an attempt classified `reason` (`None` for the
    /// initial, non-retry attempt). In circuit-breaker mode, returns
    /// [`RetryAcquireFailure::CapacityExceeded`] immediately if capacity is insufficient;
    /// otherwise returns the delay the caller should wait before capacity will be
    /// available.
    fn acquire(&self, reason: Option<RetryReason>) -> Result<(), RetryAcquireFailure>;

    /// Credits capacity back to the bucket after a successful attempt.
    fn notify_success(&self);
}

/// Why [`RetryTokenBucket::acquire`] did not immediately grant capacity.
#[derive(Debug)]
pub enum RetryAcquireFailure {
    /// The bucket operates in circuit-breaker mode and has no capacity left at all.
    CapacityExceeded(RetryCapacityExceededError),
    /// The bucket operates in delay mode: wait this long, then the request would have
    /// enough capacity (assuming no other caller spends it first).
    Delay(Duration),
}

impl fmt::Display for RetryAcquireFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryAcquireFailure::CapacityExceeded(e) => write!(f, "{e}"),
            RetryAcquireFailure::Delay(d) => write!(f, "insufficient retry capacity, retry after {d:?}"),
        }
    }
}

impl std::error::Error for RetryAcquireFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryAcquireFailure::CapacityExceeded(e) => Some(e),
            RetryAcquireFailure::Delay(_) => None,
        }
    }
}

struct State {
    capacity: u32,
    max_capacity: u32,
    refill_units_per_second: u32,
    last_refill: Option<std::time::Instant>,
}

impl State {
    fn refill(&mut self, now: std::time::Instant) {
        if let Some(last) = self.last_refill {
            let elapsed = now.saturating_duration_since(last).as_secs_f64();
            let refill_amount = (elapsed * self.refill_units_per_second as f64).floor() as u32;
            self.capacity = self.capacity.saturating_add(refill_amount).min(self.max_capacity);
        }
        self.last_refill = Some(now);
    }
}

/// The default, circuit-breaking retry token bucket: a fixed-size integer capacity pool
/// that refills at a constant rate. See the module-level constants for the per-reason
/// costs and default capacity.
pub struct StandardRetryTokenBucket {
    state: Mutex<State>,
    retry_cost: u32,
    timeout_retry_cost: u32,
    success_increment: u32,
    circuit_breaker_mode: bool,
}

impl fmt::Debug for StandardRetryTokenBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("StandardRetryTokenBucket")
            .field("capacity", &state.capacity)
            .field("max_capacity", &state.max_capacity)
            .field("circuit_breaker_mode", &self.circuit_breaker_mode)
            .finish()
    }
}

impl Default for StandardRetryTokenBucket {
    fn default() -> Self {
        Self::builder().build().expect("default configuration is always valid")
    }
}

impl StandardRetryTokenBucket {
    /// Returns a builder for configuring a [`StandardRetryTokenBucket`].
    pub fn builder() -> StandardRetryTokenBucketBuilder {
        StandardRetryTokenBucketBuilder::default()
    }
}

impl RetryTokenBucket for StandardRetryTokenBucket {
    fn acquire(&self, reason: Option<RetryReason>) -> Result<(), RetryAcquireFailure> {
        let cost = match reason {
            None => INITIAL_TRY_COST,
            Some(RetryReason::Throttling) => self.timeout_retry_cost,
            Some(RetryReason::Transient) | Some(RetryReason::ServerSide) | Some(RetryReason::ClientSide) => {
                self.retry_cost
            }
        };
        let mut state = self.state.lock().unwrap();
        state.refill(std::time::Instant::now());

        if cost <= state.capacity {
            state.capacity -= cost;
            debug!(cost, remaining = state.capacity, "acquired retry token bucket capacity");
            return Ok(());
        }

        if self.circuit_breaker_mode {
            warn!(cost, available = state.capacity, "retry token bucket exhausted");
            return Err(RetryAcquireFailure::CapacityExceeded(RetryCapacityExceededError::new(None)));
        }

        let extra = cost - state.capacity;
        let seconds = extra as f64 / state.refill_units_per_second.max(1) as f64;
        Err(RetryAcquireFailure::Delay(Duration::from_secs_f64(seconds.ceil())))
    }

    fn notify_success(&self) {
        let mut state = self.state.lock().unwrap();
        state.refill(std::time::Instant::now());
        state.capacity = state.capacity.saturating_add(self.success_increment).min(state.max_capacity);
    }
}

/// Builder for [`StandardRetryTokenBucket`].
#[derive(Debug, Clone)]
pub struct StandardRetryTokenBucketBuilder {
    max_capacity: u32,
    refill_units_per_second: u32,
    retry_cost: u32,
    timeout_retry_cost: u32,
    success_increment: u32,
    circuit_breaker_mode: bool,
}

impl Default for StandardRetryTokenBucketBuilder {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_CAPACITY,
            refill_units_per_second: DEFAULT_CAPACITY,
            retry_cost: DEFAULT_RETRY_COST,
            timeout_retry_cost: DEFAULT_TIMEOUT_RETRY_COST,
            success_increment: DEFAULT_SUCCESS_INCREMENT,
            circuit_breaker_mode: true,
        }
    }
}

impl StandardRetryTokenBucketBuilder {
    /// Sets the maximum capacity the bucket can hold. Default: 500.
    pub fn max_capacity(mut self, max_capacity: u32) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Sets the rate, in capacity units per second, at which the bucket refills. Default:
    /// equal to `max_capacity`, i.e. the bucket is effectively always full between
    /// operations spaced more than a second apart.
    pub fn refill_units_per_second(mut self, refill_units_per_second: u32) -> Self {
        self.refill_units_per_second = refill_units_per_second;
        self
    }

    /// Sets the cost of an ordinary (non-timeout, non-throttling) retry. Default: 5.
    pub fn retry_cost(mut self, retry_cost: u32) -> Self {
        self.retry_cost = retry_cost;
        self
    }

    /// Sets the cost of a retry following a timeout or throttling response. Default: 10.
    pub fn timeout_retry_cost(mut self, timeout_retry_cost: u32) -> Self {
        self.timeout_retry_cost = timeout_retry_cost;
        self
    }

    /// Sets the capacity credited back on a successful attempt. Default: 1.
    pub fn success_increment(mut self, success_increment: u32) -> Self {
        self.success_increment = success_increment;
        self
    }

    /// Sets whether an exhausted bucket fails immediately (`true`, the default) rather than
    /// returning a delay to wait out.
    pub fn circuit_breaker_mode(mut self, circuit_breaker_mode: bool) -> Self {
        self.circuit_breaker_mode = circuit_breaker_mode;
        self
    }

    /// Builds the token bucket, starting at full capacity.
    pub fn build(self) -> Result<StandardRetryTokenBucket, smithy_types::error::BuildError> {
        if self.refill_units_per_second == 0 {
            return Err(smithy_types::error::BuildError::new(
                "refill_units_per_second must be greater than zero",
            ));
        }
        Ok(StandardRetryTokenBucket {
            state: Mutex::new(State {
                capacity: self.max_capacity,
                max_capacity: self.max_capacity,
                refill_units_per_second: self.refill_units_per_second,
                last_refill: None,
            }),
            retry_cost: self.retry_cost,
            timeout_retry_cost: self.timeout_retry_cost,
            success_increment: self.success_increment,
            circuit_breaker_mode: self.circuit_breaker_mode,
        })
    }
}

/// A token bucket that never withholds capacity: every [`RetryTokenBucket::acquire`] call
/// succeeds immediately. Useful for tests, or for callers that want the retry loop's
/// backoff/classification behavior without its rate-limiting.
#[derive(Debug, Default, Clone, Copy)]
pub struct InfiniteTokenBucket;

impl RetryTokenBucket for InfiniteTokenBucket {
    fn acquire(&self, _reason: Option<RetryReason>) -> Result<(), RetryAcquireFailure> {
        Ok(())
    }

    fn notify_success(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_attempt_costs_nothing() {
        let bucket = StandardRetryTokenBucket::builder().max_capacity(10).build().unwrap();
        assert_eq!(bucket.state.lock().unwrap().capacity, 10);
        bucket.acquire(None).unwrap();
        assert_eq!(bucket.state.lock().unwrap().capacity, 10);
    }

    #[test]
    fn ordinary_retry_spends_the_default_cost() {
        let bucket = StandardRetryTokenBucket::builder().max_capacity(10).build().unwrap();
        bucket.acquire(Some(RetryReason::Transient)).unwrap();
        assert_eq!(bucket.state.lock().unwrap().capacity, 5);
    }

    #[test]
    fn throttling_retry_spends_the_timeout_cost() {
        let bucket = StandardRetryTokenBucket::builder().max_capacity(10).build().unwrap();
        bucket.acquire(Some(RetryReason::Throttling)).unwrap();
        assert_eq!(bucket.state.lock().unwrap().capacity, 0);
    }

    #[test]
    fn circuit_breaker_mode_fails_fast_when_exhausted() {
        let bucket = StandardRetryTokenBucket::builder().max_capacity(3).build().unwrap();
        let err = bucket.acquire(Some(RetryReason::Throttling)).unwrap_err();
        assert!(matches!(err, RetryAcquireFailure::CapacityExceeded(_)));
    }

    #[test]
    fn non_circuit_mode_returns_a_delay_instead_of_failing() {
        let bucket = StandardRetryTokenBucket::builder()
            .max_capacity(3)
            .refill_units_per_second(3)
            .circuit_breaker_mode(false)
            .build()
            .unwrap();
        match bucket.acquire(Some(RetryReason::Throttling)).unwrap_err() {
            RetryAcquireFailure::Delay(d) => assert!(d.as_secs_f64() > 0.0),
            other => panic!("expected a delay, got {other:?}"),
        }
    }

    #[test]
    fn success_credits_capacity_back_up_to_the_max() {
        let bucket = StandardRetryTokenBucket::builder().max_capacity(10).build().unwrap();
        bucket.acquire(Some(RetryReason::Transient)).unwrap();
        assert_eq!(bucket.state.lock().unwrap().capacity, 5);
        bucket.notify_success();
        assert_eq!(bucket.state.lock().unwrap().capacity, 6);
        for _ in 0..10 {
            bucket.notify_success();
        }
        assert_eq!(bucket.state.lock().unwrap().capacity, 10);
    }

    #[test]
    fn infinite_bucket_never_withholds_capacity() {
        let bucket = InfiniteTokenBucket;
        for _ in 0..1000 {
            bucket.acquire(Some(RetryReason::Throttling)).unwrap();
        }
        bucket.notify_success();
    }
}
