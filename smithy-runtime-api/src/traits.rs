/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Collaborator traits a protocol/transport implementation fulfills: turning a typed
//! input into a request (`RequestSerializer`), sending it (`Connection`), turning the
//! response back into a typed output or error (`ResponseDeserializer`), and deciding
//! whether a failed attempt should be retried (`RetryStrategy`).

use crate::context::ExecutionContext;
use crate::type_erased::TypeErasedBox;
use smithy_types::error::BoxError;
use smithy_types::http::{HttpRequest, HttpRequestBuilder, HttpResponse};
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

/// A boxed future, since collaborator traits must be object-safe (`dyn Connection`, etc.)
/// and Rust does not yet support `async fn` in trait objects.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Converts the caller-typed input into an HTTP request, run during the `Serialize`
/// phase.
pub trait RequestSerializer: Send + Sync + Debug {
    /// Serializes `input` (the erased operation input) into a request builder.
    fn serialize(&self, input: &TypeErasedBox, cx: &ExecutionContext) -> Result<HttpRequestBuilder, BoxError>;
}

/// Converts the raw HTTP response into the modeled output or a modeled error, run during
/// the `Deserialize` phase.
pub trait ResponseDeserializer: Send + Sync + Debug {
    /// Deserializes `response` into the erased operation output, or a modeled error
    /// wrapped as an erased box of the service's error type.
    fn deserialize(&self, response: &mut HttpResponse, cx: &ExecutionContext) -> Result<TypeErasedBox, TypeErasedBox>;
}

/// Sends a request and returns the raw response, run during the `Transmit` phase. The
/// only phase permitted to perform network I/O.
pub trait Connection: Send + Sync + Debug {
    /// Transmits `request`, returning the response or a transport-level failure.
    fn call<'a>(&'a self, request: &'a mut HttpRequest, cx: &'a ExecutionContext) -> BoxFuture<'a, Result<HttpResponse, BoxError>>;
}

/// Decides whether a failed attempt should be retried. The only component in the
/// pipeline permitted to transform an error into a retry decision; every other phase
/// propagates failures unchanged.
pub trait RetryStrategy: Send + Sync + Debug {
    /// Called before the first attempt to confirm capacity is available at all.
    fn should_attempt_initial_request(&self, cx: &ExecutionContext) -> Result<(), BoxError>;

    /// Called after a failed attempt to decide whether another attempt should be made.
    fn should_attempt_retry(&self, attempt: u32, error: &OrchestratorErrorRef<'_>, cx: &ExecutionContext) -> Result<bool, BoxError>;
}

/// A borrowed view of an [`crate::OrchestratorError`], passed to [`RetryStrategy`]
/// without requiring this crate to depend on a concrete error classification scheme.
#[derive(Debug)]
pub struct OrchestratorErrorRef<'a> {
    /// The phase the failure occurred in.
    pub phase: crate::phase::Phase,
    /// The underlying failure.
    pub source: &'a (dyn std::error::Error + Send + Sync + 'static),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    #[derive(Debug)]
    struct AlwaysRetry;
    impl RetryStrategy for AlwaysRetry {
        fn should_attempt_initial_request(&self, _cx: &ExecutionContext) -> Result<(), BoxError> {
            Ok(())
        }
        fn should_attempt_retry(&self, attempt: u32, _error: &OrchestratorErrorRef<'_>, _cx: &ExecutionContext) -> Result<bool, BoxError> {
            Ok(attempt < 3)
        }
    }

    #[test]
    fn retry_strategy_trait_is_object_safe_and_callable() {
        let strategy: Box<dyn RetryStrategy> = Box::new(AlwaysRetry);
        let cx = ExecutionContext::new();
        assert!(strategy.should_attempt_initial_request(&cx).is_ok());
        let err = std::io::Error::other("boom");
        let err_ref = OrchestratorErrorRef {
            phase: Phase::Transmit,
            source: &err,
        };
        assert!(strategy.should_attempt_retry(1, &err_ref, &cx).unwrap());
        assert!(!strategy.should_attempt_retry(3, &err_ref, &cx).unwrap());
    }
}
