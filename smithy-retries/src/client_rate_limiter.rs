/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! An adaptive rate limiter that learns a safe send rate from throttling responses.
//!
//! Unlike [`crate::token_bucket::StandardRetryTokenBucket`] (a fixed-budget pool spent per
//! attempt), this limiter maintains a fill rate `rfps` that a cubic controller continuously
//! adjusts: every throttling response scales the rate down by a fixed fraction (`beta`),
//! and every quiet second since then scales it back up along a cubic curve, the same shape
//! TCP CUBIC uses to probe for available bandwidth after a congestion event. The limiter is
//! inert — it grants every request immediately — until the first throttling signal is
//! observed; only then does it start gating attempts.

use smithy_async::time::{SharedTimeSource, TimeSource};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Enforced as a floor on the fill rate once the limiter is active, so a long quiet period
/// can never drive the allowed rate to (or below) zero.
const MIN_FILL_RATE: f64 = 0.5;
/// Floor on the bucket's maximum capacity, mirroring `MIN_FILL_RATE`.
const MIN_CAPACITY: f64 = 1.0;
/// Smoothing factor for the exponential moving average of the measured send rate.
const SMOOTH: f64 = 0.8;
/// How much to scale back the fill rate after receiving a throttling response.
const BETA: f64 = 0.7;
/// Controls how aggressively the fill rate scales back up after being throttled.
const SCALE_CONSTANT: f64 = 0.4;

const DEFAULT_INITIAL_REQUEST_COST: f64 = 1.0;
const DEFAULT_RETRY_COST: f64 = 5.0;
const DEFAULT_RETRY_TIMEOUT_COST: f64 = 10.0;

/// What kind of attempt is requesting capacity, since each costs a different number of
/// tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestCost {
    /// The first attempt of an operation.
    InitialRequest,
    /// A retry that followed an ordinary (non-timeout) failure.
    Retry,
    /// A retry that followed a timeout or throttling response.
    RetryTimeout,
}

struct State {
    /// Tokens granted per second.
    fill_rate: f64,
    max_capacity: f64,
    current_capacity: f64,
    last_timestamp: Option<f64>,
    enabled: bool,
    measured_tx_rate: f64,
    last_tx_rate_bucket: f64,
    request_count: u64,
    last_max_rate: f64,
    time_of_last_throttle: f64,
    initial_request_cost: f64,
    retry_cost: f64,
    retry_timeout_cost: f64,
}

impl State {
    fn refill(&mut self, now_seconds: f64) {
        if let Some(last) = self.last_timestamp {
            let fill_amount = (now_seconds - last) * self.fill_rate;
            self.current_capacity = f64::min(self.max_capacity, self.current_capacity + fill_amount);
        }
        self.last_timestamp = Some(now_seconds);
    }

    fn acquire(&mut self, now_seconds: f64, cost: RequestCost) -> Result<(), Duration> {
        if !self.enabled {
            return Ok(());
        }
        let amount = match cost {
            RequestCost::InitialRequest => self.initial_request_cost,
            RequestCost::Retry => self.retry_cost,
            RequestCost::RetryTimeout => self.retry_timeout_cost,
        };

        self.refill(now_seconds);

        let result = if amount > self.current_capacity {
            let sleep_time = (amount - self.current_capacity) / self.fill_rate;
            debug!(amount, capacity = self.current_capacity, sleep_time, "client rate limiter delayed a request");
            Err(Duration::from_secs_f64(sleep_time))
        } else {
            Ok(())
        };
        self.current_capacity -= amount;
        result
    }

    fn update_refill_rate(&mut self, now_seconds: f64, new_fill_rate: f64) {
        self.refill(now_seconds);
        self.fill_rate = f64::max(new_fill_rate, MIN_FILL_RATE);
        self.max_capacity = f64::max(new_fill_rate, MIN_CAPACITY);
        self.current_capacity = f64::min(self.current_capacity, self.max_capacity);
        debug!(
            fill_rate = self.fill_rate,
            max_capacity = self.max_capacity,
            current_capacity = self.current_capacity,
            "client rate limiter state has been updated"
        );
    }

    fn update_measured_tx_rate(&mut self, now_seconds: f64) {
        let next_time_bucket = (now_seconds * 2.0).floor() / 2.0;
        self.request_count += 1;
        if next_time_bucket > self.last_tx_rate_bucket {
            let current_rate = self.request_count as f64 / (next_time_bucket - self.last_tx_rate_bucket);
            self.measured_tx_rate = current_rate * SMOOTH + self.measured_tx_rate * (1.0 - SMOOTH);
            self.request_count = 0;
            self.last_tx_rate_bucket = next_time_bucket;
        }
    }

    fn time_window(&self) -> f64 {
        ((self.last_max_rate * (1.0 - BETA)) / SCALE_CONSTANT).powf(1.0 / 3.0)
    }

    fn cubic_success_rate(&self, now_seconds: f64) -> f64 {
        let dt = now_seconds - self.time_of_last_throttle - self.time_window();
        SCALE_CONSTANT * dt.powi(3) + self.last_max_rate
    }

    fn update(&mut self, now_seconds: f64, throttled: bool) {
        self.update_measured_tx_rate(now_seconds);

        let calculated_rate = if throttled {
            let rate_to_use = if self.enabled {
                f64::min(self.measured_tx_rate, self.fill_rate)
            } else {
                self.measured_tx_rate
            };
            self.last_max_rate = rate_to_use;
            self.time_of_last_throttle = now_seconds;
            if !self.enabled {
                debug!("client rate limiting has been enabled");
            }
            self.enabled = true;
            rate_to_use * BETA
        } else {
            self.cubic_success_rate(now_seconds)
        };

        let new_rate = f64::min(calculated_rate, 2.0 * self.measured_tx_rate);
        self.update_refill_rate(now_seconds, new_rate);
    }
}

/// An adaptive, cubic-controlled client-side rate limiter, shared across every attempt of
/// every operation that contends for a given partition (e.g. one per region/endpoint).
#[derive(Clone)]
pub struct AdaptiveClientRateLimiter {
    state: std::sync::Arc<Mutex<State>>,
    time_source: SharedTimeSource,
}

impl std::fmt::Debug for AdaptiveClientRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("AdaptiveClientRateLimiter")
            .field("fill_rate", &state.fill_rate)
            .field("enabled", &state.enabled)
            .finish()
    }
}

impl Default for AdaptiveClientRateLimiter {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AdaptiveClientRateLimiter {
    /// Returns a builder for configuring an [`AdaptiveClientRateLimiter`].
    pub fn builder() -> AdaptiveClientRateLimiterBuilder {
        AdaptiveClientRateLimiterBuilder::default()
    }

    fn now_seconds(&self) -> f64 {
        self.time_source
            .now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }

    /// Attempts to acquire permission to send a request of the given cost. Returns `Ok(())`
    /// if the request may proceed now, or `Err(delay)` with how long the caller should wait
    /// first. Before the first throttling signal is observed, every call returns `Ok(())`.
    pub fn acquire_permission(&self, cost: RequestCost) -> Result<(), Duration> {
        let now = self.now_seconds();
        self.state.lock().unwrap().acquire(now, cost)
    }

    /// Feeds the outcome of one attempt back into the controller: `throttled = true` scales
    /// the fill rate down; `throttled = false` lets it climb back up along the cubic curve
    /// (a no-op until the limiter has been enabled by a prior throttle).
    pub fn update(&self, throttled: bool) {
        let now = self.now_seconds();
        self.state.lock().unwrap().update(now, throttled);
    }
}

/// Builder for [`AdaptiveClientRateLimiter`].
#[derive(Debug, Clone, Default)]
pub struct AdaptiveClientRateLimiterBuilder {
    time_source: Option<SharedTimeSource>,
    initial_request_cost: Option<f64>,
    retry_cost: Option<f64>,
    retry_timeout_cost: Option<f64>,
}

impl AdaptiveClientRateLimiterBuilder {
    /// Sets the clock used to read the current time. Defaults to the system clock; tests
    /// should inject a [`smithy_async::time::ManualTimeSource`] instead.
    pub fn time_source(mut self, time_source: SharedTimeSource) -> Self {
        self.time_source = Some(time_source);
        self
    }

    /// Sets the cost, in tokens, of the initial (non-retry) attempt of an operation.
    /// Default: 1.0.
    pub fn initial_request_cost(mut self, cost: f64) -> Self {
        self.initial_request_cost = Some(cost);
        self
    }

    /// Sets the cost of an ordinary retry. Default: 5.0.
    pub fn retry_cost(mut self, cost: f64) -> Self {
        self.retry_cost = Some(cost);
        self
    }

    /// Sets the cost of a retry that followed a timeout or throttling response. Default: 10.0.
    pub fn retry_timeout_cost(mut self, cost: f64) -> Self {
        self.retry_timeout_cost = Some(cost);
        self
    }

    /// Builds the rate limiter, starting disabled (every request is admitted) until the
    /// first throttling signal is observed via [`AdaptiveClientRateLimiter::update`].
    pub fn build(self) -> AdaptiveClientRateLimiter {
        AdaptiveClientRateLimiter {
            state: std::sync::Arc::new(Mutex::new(State {
                fill_rate: MIN_FILL_RATE,
                max_capacity: f64::MAX,
                current_capacity: 0.0,
                last_timestamp: None,
                enabled: false,
                measured_tx_rate: 0.0,
                last_tx_rate_bucket: 0.0,
                request_count: 0,
                last_max_rate: 0.0,
                time_of_last_throttle: 0.0,
                initial_request_cost: self.initial_request_cost.unwrap_or(DEFAULT_INITIAL_REQUEST_COST),
                retry_cost: self.retry_cost.unwrap_or(DEFAULT_RETRY_COST),
                retry_timeout_cost: self.retry_timeout_cost.unwrap_or(DEFAULT_RETRY_TIMEOUT_COST),
            })),
            time_source: self.time_source.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter_at(last_max_rate: f64, time_of_last_throttle: f64) -> State {
        State {
            fill_rate: MIN_FILL_RATE,
            max_capacity: f64::MAX,
            current_capacity: 0.0,
            last_timestamp: None,
            enabled: false,
            measured_tx_rate: 0.0,
            last_tx_rate_bucket: 0.0,
            request_count: 0,
            last_max_rate,
            time_of_last_throttle,
            initial_request_cost: DEFAULT_INITIAL_REQUEST_COST,
            retry_cost: DEFAULT_RETRY_COST,
            retry_timeout_cost: DEFAULT_RETRY_TIMEOUT_COST,
        }
    }

    fn approx_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn throttle_scales_the_rate_down_by_beta() {
        let state = limiter_at(10.0, 1.0);
        approx_eq(state.last_max_rate * BETA, 7.0);
    }

    #[test]
    fn cubic_success_matches_the_published_go_sdk_vector() {
        let mut state = limiter_at(10.0, 5.0);
        let attempts = [
            (5.0, 7.0),
            (6.0, 9.64893600966),
            (7.0, 10.000030849917364),
            (8.0, 10.453284520772092),
            (9.0, 13.408697022224185),
            (10.0, 21.26626835427364),
            (11.0, 36.425998516920465),
        ];
        for (now, expected) in attempts {
            approx_eq(state.cubic_success_rate(now), expected);
            state.last_timestamp = Some(now);
        }
    }

    #[test]
    fn limiter_starts_disabled_and_admits_every_request() {
        let limiter = AdaptiveClientRateLimiter::builder()
            .time_source(SharedTimeSource::new(smithy_async::time::ManualTimeSource::new(
                std::time::SystemTime::UNIX_EPOCH,
            )))
            .build();
        assert!(limiter.acquire_permission(RequestCost::InitialRequest).is_ok());
        assert!(!limiter.state.lock().unwrap().enabled);
    }

    #[test]
    fn first_throttle_enables_the_limiter() {
        let limiter = AdaptiveClientRateLimiter::builder().build();
        assert!(!limiter.state.lock().unwrap().enabled);
        limiter.update(true);
        assert!(limiter.state.lock().unwrap().enabled);
    }

    #[test]
    fn a_quiet_period_after_a_throttle_lets_the_rate_climb_back_up() {
        let limiter = AdaptiveClientRateLimiter::builder().build();
        limiter.update(true);
        let rate_immediately_after = limiter.state.lock().unwrap().fill_rate;
        // Simulate time passing by directly advancing last_timestamp/time_of_last_throttle.
        {
            let mut state = limiter.state.lock().unwrap();
            state.time_of_last_throttle -= 30.0;
        }
        limiter.update(false);
        let rate_later = limiter.state.lock().unwrap().fill_rate;
        assert!(rate_later >= rate_immediately_after);
    }
}
