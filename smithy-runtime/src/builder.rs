/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Registers middleware and collaborators into named phases, then freezes the result
//! into an immutable [`Orchestrator`]. Matches spec.md's REDESIGN FLAGS: feature/plugin
//! installation happens once, at client construction, via this builder — there is no
//! mechanism to mutate an already-built pipeline at request time.

use crate::orchestrator::{FinalizeOutcome, Orchestrator};
use crate::signer::Signer;
use smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep};
use smithy_retries::token_bucket::{InfiniteTokenBucket, RetryTokenBucket};
use smithy_runtime_api::traits::{Connection, RequestSerializer, ResponseDeserializer, RetryStrategy};
use smithy_runtime_api::type_erased::TypeErasedBox;
use smithy_runtime_api::Middleware;
use smithy_types::error::BuildError;
use smithy_types::http::HttpRequestBuilder;
use std::sync::Arc;

/// A retry strategy that always permits the first attempt and never retries a failure.
/// The default when no [`RetryStrategy`] is configured, so a freshly built orchestrator
/// is usable without requiring retry configuration up front.
#[derive(Debug, Default)]
struct NeverRetry;

impl RetryStrategy for NeverRetry {
    fn should_attempt_initial_request(&self, _cx: &smithy_runtime_api::ExecutionContext) -> Result<(), smithy_types::error::BoxError> {
        Ok(())
    }

    fn should_attempt_retry(
        &self,
        _attempt: u32,
        _error: &smithy_runtime_api::traits::OrchestratorErrorRef<'_>,
        _cx: &smithy_runtime_api::ExecutionContext,
    ) -> Result<bool, smithy_types::error::BoxError> {
        Ok(false)
    }
}

/// Builds an [`Orchestrator`]. Every collaborator except the request serializer,
/// response deserializer, connection, and signer has a usable default, so a minimal
/// pipeline only needs those four set.
pub struct PipelineBuilder {
    initialize_middleware: Vec<Box<dyn Middleware<TypeErasedBox>>>,
    mutate_middleware: Vec<Box<dyn Middleware<HttpRequestBuilder>>>,
    finalize_middleware: Vec<Box<dyn Middleware<FinalizeOutcome>>>,
    request_serializer: Option<Box<dyn RequestSerializer>>,
    response_deserializer: Option<Box<dyn ResponseDeserializer>>,
    connection: Option<Box<dyn Connection>>,
    signer: Option<Box<dyn Signer>>,
    retry_strategy: Box<dyn RetryStrategy>,
    token_bucket: Arc<dyn RetryTokenBucket>,
    sleep: Option<SharedAsyncSleep>,
    max_attempts: u32,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            initialize_middleware: Vec::new(),
            mutate_middleware: Vec::new(),
            finalize_middleware: Vec::new(),
            request_serializer: None,
            response_deserializer: None,
            connection: None,
            signer: None,
            retry_strategy: Box::new(NeverRetry),
            token_bucket: Arc::new(InfiniteTokenBucket),
            sleep: None,
            max_attempts: 1,
        }
    }
}

impl PipelineBuilder {
    /// Starts a new builder with no middleware registered and no retrying.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends middleware to the `Initialize` phase, run in registration order.
    pub fn intercept_initialize(mut self, middleware: impl Middleware<TypeErasedBox> + 'static) -> Self {
        self.initialize_middleware.push(Box::new(middleware));
        self
    }

    /// Appends middleware to the `Mutate` phase, run in registration order.
    pub fn intercept_mutate(mut self, middleware: impl Middleware<HttpRequestBuilder> + 'static) -> Self {
        self.mutate_middleware.push(Box::new(middleware));
        self
    }

    /// Appends middleware to the `Finalize` phase, run in registration order.
    pub fn intercept_finalize(mut self, middleware: impl Middleware<FinalizeOutcome> + 'static) -> Self {
        self.finalize_middleware.push(Box::new(middleware));
        self
    }

    /// Sets the `Serialize` phase's collaborator. Required.
    pub fn request_serializer(mut self, serializer: impl RequestSerializer + 'static) -> Self {
        self.request_serializer = Some(Box::new(serializer));
        self
    }

    /// Sets the `Deserialize` phase's collaborator. Required.
    pub fn response_deserializer(mut self, deserializer: impl ResponseDeserializer + 'static) -> Self {
        self.response_deserializer = Some(Box::new(deserializer));
        self
    }

    /// Sets the `Transmit` phase's collaborator. Required.
    pub fn connection(mut self, connection: impl Connection + 'static) -> Self {
        self.connection = Some(Box::new(connection));
        self
    }

    /// Sets the `Sign` phase's collaborator. Required.
    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Box::new(signer));
        self
    }

    /// Sets the retry strategy consulted after each failed attempt. Defaults to never
    /// retrying.
    pub fn retry_strategy(mut self, retry_strategy: impl RetryStrategy + 'static) -> Self {
        self.retry_strategy = Box::new(retry_strategy);
        self
    }

    /// Sets the token bucket rationing retry attempts. Defaults to
    /// [`InfiniteTokenBucket`] (no rationing).
    pub fn token_bucket(mut self, token_bucket: impl RetryTokenBucket + 'static) -> Self {
        self.token_bucket = Arc::new(token_bucket);
        self
    }

    /// Sets the sleep implementation used for retry backoff delays.
    pub fn sleep(mut self, sleep: impl AsyncSleep + 'static) -> Self {
        self.sleep = Some(SharedAsyncSleep::new(sleep));
        self
    }

    /// Sets the maximum number of attempts (including the first) an operation will make.
    /// Default: 1 (no retries, regardless of the configured retry strategy).
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Freezes the pipeline. Fails if any of the four required collaborators
    /// (serializer, deserializer, connection, signer) was never set.
    pub fn build(self) -> Result<Orchestrator, BuildError> {
        Ok(Orchestrator {
            initialize_middleware: self.initialize_middleware,
            mutate_middleware: self.mutate_middleware,
            finalize_middleware: self.finalize_middleware,
            request_serializer: self
                .request_serializer
                .ok_or_else(|| BuildError::new("a request serializer is required"))?,
            response_deserializer: self
                .response_deserializer
                .ok_or_else(|| BuildError::new("a response deserializer is required"))?,
            connection: self.connection.ok_or_else(|| BuildError::new("a connection is required"))?,
            signer: self.signer.ok_or_else(|| BuildError::new("a signer is required"))?,
            retry_strategy: self.retry_strategy,
            token_bucket: self.token_bucket,
            sleep: self.sleep.unwrap_or_default(),
            max_attempts: self.max_attempts,
        })
    }
}

