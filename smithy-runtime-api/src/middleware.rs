/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The seam every phase's middleware list is built from: `(subject, next) -> subject`.
//!
//! A single [`Phase`](crate::Phase) is generic over the subject type it operates on (an
//! `HttpRequestBuilder` for `Mutate`/`Sign`, a not-yet-dispatched request for `Transmit`,
//! and so on), so `Middleware` is generic over that subject type rather than fixed to one
//! concrete request/response pair.

use crate::context::ExecutionContext;
use crate::error::OrchestratorError;

/// Transforms a `subject` of type `S` and delegates to the next middleware (or the
/// phase's terminal handler) in the chain. Implementations must call
/// [`Next::call`] exactly once unless they short-circuit by returning without calling
/// it — e.g. a caching middleware that returns a complete response without transmitting.
pub trait Middleware<S>: Send + Sync + std::fmt::Debug {
    /// A short name for logging (`tracing::debug!(middleware = self.name(), ...)`).
    fn name(&self) -> &'static str;

    /// Processes `subject`, typically calling `next.call(subject, cx)` to delegate
    /// downstream and then inspecting or transforming the result.
    fn handle(&self, subject: S, cx: &mut ExecutionContext, next: Next<'_, S>) -> Result<S, OrchestratorError>;
}

/// A handle to the rest of the middleware chain, callable exactly once.
pub struct Next<'a, S> {
    inner: &'a mut dyn FnMut(S, &mut ExecutionContext) -> Result<S, OrchestratorError>,
}

impl<'a, S> Next<'a, S> {
    /// Wraps a closure representing the remainder of the chain.
    pub fn new(f: &'a mut dyn FnMut(S, &mut ExecutionContext) -> Result<S, OrchestratorError>) -> Self {
        Self { inner: f }
    }

    /// Invokes the rest of the chain with `subject`.
    pub fn call(self, subject: S, cx: &mut ExecutionContext) -> Result<S, OrchestratorError> {
        (self.inner)(subject, cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    #[derive(Debug)]
    struct Uppercase;
    impl Middleware<String> for Uppercase {
        fn name(&self) -> &'static str {
            "uppercase"
        }
        fn handle(&self, subject: String, cx: &mut ExecutionContext, next: Next<'_, String>) -> Result<String, OrchestratorError> {
            next.call(subject.to_uppercase(), cx)
        }
    }

    #[derive(Debug)]
    struct Failing;
    impl Middleware<String> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn handle(&self, _subject: String, _cx: &mut ExecutionContext, _next: Next<'_, String>) -> Result<String, OrchestratorError> {
            Err(OrchestratorError::new(Phase::Mutate, std::io::Error::other("nope")))
        }
    }

    #[test]
    fn middleware_transforms_the_subject_before_delegating() {
        let mw = Uppercase;
        let mut cx = ExecutionContext::new();
        let mut terminal = |s: String, _: &mut ExecutionContext| Ok(s);
        let result = mw.handle("hi".to_string(), &mut cx, Next::new(&mut terminal));
        assert_eq!(result.unwrap(), "HI");
    }

    #[test]
    fn a_middleware_can_short_circuit_without_calling_next() {
        let mw = Failing;
        let mut cx = ExecutionContext::new();
        let mut terminal = |s: String, _: &mut ExecutionContext| Ok(s);
        let result = mw.handle("hi".to_string(), &mut cx, Next::new(&mut terminal));
        assert!(result.is_err());
    }
}
