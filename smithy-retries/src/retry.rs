/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The retry loop: repeatedly executes an operation, consulting a [`RetryPolicy`] to
//! classify each outcome and a [`RetryToken`] to pace and pay for each attempt.

use crate::error::TooManyAttemptsError;
use crate::token_bucket::{RetryAcquireFailure, RetryTokenBucket};
use smithy_async::rt::sleep::AsyncSleep;
use smithy_types::error::BoxError;
use smithy_types::retry::{RetryDirective, RetryReason};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Classifies the outcome of one attempt into a [`RetryDirective`]. Implemented once per
/// protocol/service (HTTP status codes, modeled error shapes, transport-level errors) and
/// supplied to [`retry`].
pub trait RetryPolicy<T, E> {
    /// Examines one attempt's result and decides whether the retry loop should stop (with
    /// success or failure) or try again.
    fn classify(&self, result: &Result<T, E>) -> RetryDirective;
}

/// A `RetryPolicy` built from a plain closure, for policies simple enough not to need a
/// dedicated type.
impl<T, E, F> RetryPolicy<T, E> for F
where
    F: Fn(&Result<T, E>) -> RetryDirective,
{
    fn classify(&self, result: &Result<T, E>) -> RetryDirective {
        self(result)
    }
}

/// Computes the delay before the next attempt. [`ExponentialBackoffWithJitter`] is the only
/// implementation needed by the standard retry strategy, but the trait lets callers supply
/// an alternative schedule (e.g. a fixed-delay policy in tests).
pub trait BackoffStrategy: std::fmt::Debug + Send + Sync {
    /// Returns the delay to wait before the `attempt`-th retry (1-based: `1` is the delay
    /// before the first retry, `2` before the second, and so on).
    fn backoff(&self, attempt: u32) -> Duration;
}

/// Exponential backoff with full jitter: `min(initial_delay * scale_factor^(n-1), max_backoff)`,
/// then scaled down by a uniformly random factor in `[1 - jitter, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoffWithJitter {
    initial_delay: Duration,
    scale_factor: f64,
    max_backoff: Duration,
    jitter: f64,
}

impl Default for ExponentialBackoffWithJitter {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs_f64(1.0),
            scale_factor: 2.0,
            max_backoff: Duration::from_secs(20),
            jitter: 1.0,
        }
    }
}

impl ExponentialBackoffWithJitter {
    /// Returns a builder, validated on [`ExponentialBackoffWithJitterBuilder::build`].
    pub fn builder() -> ExponentialBackoffWithJitterBuilder {
        ExponentialBackoffWithJitterBuilder::default()
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let n = attempt.saturating_sub(1) as i32;
        let exp = self.scale_factor.powi(n) * self.initial_delay.as_secs_f64();
        let capped = f64::min(exp, self.max_backoff.as_secs_f64());
        let jitter_floor = 1.0 - self.jitter;
        let random = jitter_floor + fastrand::f64() * self.jitter;
        Duration::from_secs_f64(capped * random)
    }
}

impl BackoffStrategy for ExponentialBackoffWithJitter {
    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_for(attempt)
    }
}

/// Builder for [`ExponentialBackoffWithJitter`].
#[derive(Debug, Clone, Default)]
pub struct ExponentialBackoffWithJitterBuilder {
    initial_delay: Option<Duration>,
    scale_factor: Option<f64>,
    max_backoff: Option<Duration>,
    jitter: Option<f64>,
}

impl ExponentialBackoffWithJitterBuilder {
    /// Sets the delay before the first retry (attempt 1). Default: 1 second.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Sets the multiplier applied per subsequent attempt. Default: 2.0.
    pub fn scale_factor(mut self, factor: f64) -> Self {
        self.scale_factor = Some(factor);
        self
    }

    /// Sets the ceiling any computed backoff is capped at. Default: 20 seconds.
    pub fn max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = Some(max);
        self
    }

    /// Sets the fraction of the computed backoff that is randomized away, in `[0, 1]`.
    /// `0.0` disables jitter entirely; `1.0` (the default) allows the full range.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Builds the strategy, returning a [`smithy_types::error::BuildError`] if any value is
    /// out of range.
    pub fn build(self) -> Result<ExponentialBackoffWithJitter, smithy_types::error::BuildError> {
        let initial_delay = self.initial_delay.unwrap_or(Duration::from_secs_f64(1.0));
        let scale_factor = self.scale_factor.unwrap_or(2.0);
        let max_backoff = self.max_backoff.unwrap_or(Duration::from_secs(20));
        let jitter = self.jitter.unwrap_or(1.0);

        if scale_factor < 1.0 {
            return Err(smithy_types::error::BuildError::new("scale_factor must be >= 1.0"));
        }
        if !(0.0..=1.0).contains(&jitter) {
            return Err(smithy_types::error::BuildError::new("jitter must be in [0.0, 1.0]"));
        }

        Ok(ExponentialBackoffWithJitter {
            initial_delay,
            scale_factor,
            max_backoff,
            jitter,
        })
    }
}

/// A handle to one acquired unit of retry capacity, returned from the bucket and reported
/// back to it exactly once: [`RetryToken::notify_success`] on a terminating success, or
/// consumed by the loop internals on a retryable failure.
#[derive(Debug)]
pub struct RetryToken {
    bucket: Arc<dyn RetryTokenBucket>,
}

impl RetryToken {
    fn new(bucket: Arc<dyn RetryTokenBucket>) -> Self {
        Self { bucket }
    }

    /// Reports that the operation this token was acquired for ultimately succeeded,
    /// returning tokens to the bucket.
    pub fn notify_success(self) {
        self.bucket.notify_success();
    }
}

/// Executes `operation` up to `max_attempts` times, retrying when `policy` classifies the
/// outcome as [`RetryDirective::RetryError`] and capacity remains in `bucket`. Sleeps
/// between attempts using `sleep` and the delay computed by `backoff`.
///
/// A cancelled future (the `operation` future being dropped before completion by the
/// caller, e.g. on timeout) is never translated into a retry attempt by this loop — it
/// simply propagates, since `operation` itself is responsible for producing its `Result`
/// only once polled to completion.
pub async fn retry<T, E, Op, Fut, P>(
    policy: P,
    bucket: Arc<dyn RetryTokenBucket>,
    backoff: &dyn BackoffStrategy,
    sleep: &dyn AsyncSleep,
    max_attempts: u32,
    mut operation: Op,
) -> Result<T, BoxError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: RetryPolicy<T, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut attempt: u32 = 1;
    let mut last_reason: Option<RetryReason> = None;

    loop {
        match bucket.acquire(last_reason) {
            Ok(()) => {}
            Err(RetryAcquireFailure::CapacityExceeded(e)) => return Err(Box::new(e)),
            Err(RetryAcquireFailure::Delay(delay)) => {
                sleep.sleep(delay).await;
            }
        }

        let result = operation().await;
        let directive = policy.classify(&result);

        match directive {
            RetryDirective::TerminateAndSucceed => {
                let token = RetryToken::new(bucket);
                token.notify_success();
                return result.map_err(|e| Box::new(e) as BoxError);
            }
            RetryDirective::TerminateAndFail => {
                return result.map_err(|e| Box::new(e) as BoxError);
            }
            RetryDirective::RetryError(reason) => {
                if attempt >= max_attempts {
                    let last_error = result.err().map(|e| Box::new(e) as BoxError).unwrap_or_else(|| {
                        Box::new(TooManyAttemptsError::new(attempt, Box::new(ClassifiedAsRetryable)))
                    });
                    return Err(Box::new(TooManyAttemptsError::new(attempt, last_error)));
                }
                last_reason = Some(reason);
                sleep.sleep(backoff.backoff(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[derive(Debug)]
struct ClassifiedAsRetryable;

impl std::fmt::Display for ClassifiedAsRetryable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation was classified as retryable")
    }
}

impl std::error::Error for ClassifiedAsRetryable {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_bucket::StandardRetryTokenBucket;
    use smithy_async::rt::sleep::TokioSleep;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Failure(&'static str);
    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }
    impl std::error::Error for Failure {}

    fn always_retry(result: &Result<u32, Failure>) -> RetryDirective {
        match result {
            Ok(_) => RetryDirective::TerminateAndSucceed,
            Err(_) => RetryDirective::RetryError(RetryReason::Transient),
        }
    }

    #[tokio::test]
    async fn succeeds_without_retrying_when_the_first_attempt_succeeds() {
        let bucket = Arc::new(StandardRetryTokenBucket::default());
        let backoff = ExponentialBackoffWithJitter::default();
        let sleep = TokioSleep::new();
        let calls = AtomicU32::new(0);

        let result = retry(always_retry, bucket, &backoff, &sleep, 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<u32, Failure>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success_within_max_attempts() {
        let bucket = Arc::new(StandardRetryTokenBucket::default());
        let backoff = ExponentialBackoffWithJitter::builder()
            .initial_delay(Duration::from_millis(1))
            .max_backoff(Duration::from_millis(2))
            .build()
            .unwrap();
        let sleep = TokioSleep::new();
        let calls = Cell::new(0u32);

        let result = retry(always_retry, bucket, &backoff, &sleep, 3, || {
            let n = calls.get();
            calls.set(n + 1);
            async move {
                if n < 2 {
                    Err(Failure("not yet"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts_with_too_many_attempts_error() {
        let bucket = Arc::new(StandardRetryTokenBucket::default());
        let backoff = ExponentialBackoffWithJitter::builder()
            .initial_delay(Duration::from_millis(1))
            .max_backoff(Duration::from_millis(2))
            .build()
            .unwrap();
        let sleep = TokioSleep::new();

        let result: Result<u32, BoxError> =
            retry(always_retry, bucket, &backoff, &sleep, 2, || async { Err(Failure("always fails")) }).await;

        let err = result.unwrap_err();
        assert!(err.downcast_ref::<TooManyAttemptsError>().is_some());
    }

    #[tokio::test]
    async fn terminate_and_fail_surfaces_immediately_without_retrying() {
        let bucket = Arc::new(StandardRetryTokenBucket::default());
        let backoff = ExponentialBackoffWithJitter::default();
        let sleep = TokioSleep::new();
        let calls = AtomicU32::new(0);

        let policy = |result: &Result<u32, Failure>| match result {
            Ok(_) => RetryDirective::TerminateAndSucceed,
            Err(_) => RetryDirective::TerminateAndFail,
        };

        let result = retry(policy, bucket, &backoff, &sleep, 5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, Failure>(Failure("not retryable")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_sequence_matches_the_scenario_4_delay_schedule() {
        // spec scenario 4: initialDelay=10ms, scaleFactor=2.0, jitter=0, maxBackoff=1s.
        let backoff = ExponentialBackoffWithJitter::builder()
            .initial_delay(Duration::from_millis(10))
            .scale_factor(2.0)
            .max_backoff(Duration::from_secs(1))
            .jitter(0.0)
            .build()
            .unwrap();
        assert_eq!(backoff.backoff(1), Duration::from_millis(10));
        assert_eq!(backoff.backoff(2), Duration::from_millis(20));
        assert_eq!(backoff.backoff(3), Duration::from_millis(40));
        assert_eq!(backoff.backoff(4), Duration::from_millis(80));
        // ... doubling continues until it hits the 1s cap.
        assert_eq!(backoff.backoff(8), Duration::from_millis(1000));
        assert_eq!(backoff.backoff(20), Duration::from_millis(1000));
    }

    #[derive(Debug, Default)]
    struct RecordingSleep {
        delays: std::sync::Mutex<Vec<Duration>>,
    }

    impl AsyncSleep for RecordingSleep {
        fn sleep(&self, duration: Duration) -> smithy_async::rt::sleep::Sleep {
            self.delays.lock().unwrap().push(duration);
            smithy_async::rt::sleep::Sleep::new(async {})
        }
    }

    #[tokio::test]
    async fn retry_loop_sleeps_the_scenario_4_delay_sequence_before_each_retry() {
        // Every attempt returns a 503, classified as a retryable server-side error; with
        // maxAttempts=3 the call count is 3 and the loop sleeps exactly twice (before
        // the 2nd and 3rd attempts), in the order 10ms then 20ms.
        let bucket = Arc::new(StandardRetryTokenBucket::default());
        let backoff = ExponentialBackoffWithJitter::builder()
            .initial_delay(Duration::from_millis(10))
            .scale_factor(2.0)
            .max_backoff(Duration::from_secs(1))
            .jitter(0.0)
            .build()
            .unwrap();
        let sleep = RecordingSleep::default();
        let calls = AtomicU32::new(0);

        let always_503 = |result: &Result<u32, Failure>| match result {
            Ok(_) => RetryDirective::TerminateAndSucceed,
            Err(_) => RetryDirective::RetryError(RetryReason::ServerSide),
        };

        let result: Result<u32, BoxError> = retry(always_503, bucket, &backoff, &sleep, 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, Failure>(Failure("503")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(result.unwrap_err().downcast_ref::<TooManyAttemptsError>().is_some());
        assert_eq!(
            *sleep.delays.lock().unwrap(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }

    #[test]
    fn backoff_never_exceeds_the_configured_maximum() {
        let backoff = ExponentialBackoffWithJitter::builder()
            .initial_delay(Duration::from_secs(1))
            .scale_factor(2.0)
            .max_backoff(Duration::from_secs(5))
            .jitter(0.0)
            .build()
            .unwrap();
        for attempt in 1..10 {
            assert!(backoff.backoff(attempt) <= Duration::from_secs(5));
        }
    }

    #[test]
    fn builder_rejects_an_out_of_range_jitter() {
        let result = ExponentialBackoffWithJitter::builder().jitter(1.5).build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_a_scale_factor_below_one() {
        let result = ExponentialBackoffWithJitter::builder().scale_factor(0.5).build();
        assert!(result.is_err());
    }
}
