/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The frozen, runnable pipeline: runs one operation invocation through the fixed
//! Initialize→Serialize→Mutate→Sign→Transmit→Deserialize→Finalize sequence, retrying
//! failed attempts per the configured [`RetryStrategy`] and [`RetryTokenBucket`].

use crate::chain::run_chain_identity;
use crate::signer::Signer;
use smithy_async::rt::sleep::SharedAsyncSleep;
use smithy_retries::token_bucket::{RetryAcquireFailure, RetryTokenBucket};
use smithy_runtime_api::traits::{Connection, OrchestratorErrorRef, RequestSerializer, ResponseDeserializer, RetryStrategy};
use smithy_runtime_api::type_erased::TypeErasedBox;
use smithy_runtime_api::{ExecutionContext, Middleware, OrchestratorError, Phase};
use smithy_types::error::BoxError;
use smithy_types::http::{HttpRequestBuilder, HttpResponse};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// The subject of the `Finalize` phase: whatever response (if any) the attempt loop
/// produced, regardless of whether the operation ultimately succeeded. Finalize
/// middleware may inspect it (e.g. to extract server-timing headers for tracing) before
/// the orchestrator completes the body automatically.
#[derive(Debug, Default)]
pub struct FinalizeOutcome {
    /// The last response received, if the `Transmit` phase ever ran successfully.
    pub response: Option<HttpResponse>,
}

/// A frozen operation execution pipeline, built by [`crate::builder::PipelineBuilder`].
pub struct Orchestrator {
    pub(crate) initialize_middleware: Vec<Box<dyn Middleware<TypeErasedBox>>>,
    pub(crate) mutate_middleware: Vec<Box<dyn Middleware<HttpRequestBuilder>>>,
    pub(crate) finalize_middleware: Vec<Box<dyn Middleware<FinalizeOutcome>>>,
    pub(crate) request_serializer: Box<dyn RequestSerializer>,
    pub(crate) response_deserializer: Box<dyn ResponseDeserializer>,
    pub(crate) connection: Box<dyn Connection>,
    pub(crate) signer: Box<dyn Signer>,
    pub(crate) retry_strategy: Box<dyn RetryStrategy>,
    pub(crate) token_bucket: Arc<dyn RetryTokenBucket>,
    pub(crate) sleep: SharedAsyncSleep,
    pub(crate) max_attempts: u32,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl Orchestrator {
    /// Runs one operation invocation: `input` (type-erased so this crate need not be
    /// generic over every service's input/output types) goes through `Initialize`, then
    /// the attempt loop (`Serialize` through `Deserialize`, possibly repeated), then
    /// `Finalize` runs exactly once regardless of outcome.
    ///
    /// A cancelled invocation (the returned future dropped before completion) never
    /// reaches the retry strategy or counts as an attempt: this function only observes
    /// an attempt's outcome once `operation`'s future (the `Transmit` call) has been
    /// polled to completion, so a drop never produces a `Result` for anything downstream
    /// to classify.
    #[instrument(skip_all)]
    pub async fn invoke(&self, input: TypeErasedBox) -> Result<TypeErasedBox, OrchestratorError> {
        let mut cx = ExecutionContext::new();
        cx.enter_phase(Phase::Initialize);
        let input = run_chain_identity(&self.initialize_middleware, input, &mut cx)?;

        self.retry_strategy
            .should_attempt_initial_request(&cx)
            .map_err(|e| OrchestratorError::new(Phase::Initialize, e))?;

        let mut last_response: Option<HttpResponse> = None;
        let mut attempt: u32 = 0;
        let mut retry_reason: Option<smithy_types::retry::RetryReason> = None;

        let outcome: Result<TypeErasedBox, OrchestratorError> = loop {
            attempt += 1;
            match self.token_bucket.acquire(retry_reason) {
                Ok(()) => {}
                Err(RetryAcquireFailure::CapacityExceeded(e)) => {
                    break Err(OrchestratorError::new(Phase::Initialize, e));
                }
                Err(RetryAcquireFailure::Delay(delay)) => {
                    self.sleep.sleep(delay).await;
                }
            }

            let attempt_result = self.run_attempt(&input, &mut cx, &mut last_response).await;

            match attempt_result {
                Ok(output) => {
                    self.token_bucket.notify_success();
                    break Ok(output);
                }
                Err(err) => {
                    let err_ref = OrchestratorErrorRef {
                        phase: err.phase(),
                        source: err.source_error(),
                    };
                    let should_retry = self
                        .retry_strategy
                        .should_attempt_retry(attempt, &err_ref, &cx)
                        .unwrap_or(false);
                    if !should_retry || attempt >= self.max_attempts {
                        warn!(attempt, phase = %err.phase().name(), "operation failed and will not be retried");
                        break Err(err);
                    }
                    debug!(attempt, phase = %err.phase().name(), "retrying after a failed attempt");
                    retry_reason = Some(classify_for_retry(&err));
                }
            }
        };

        cx.enter_phase(Phase::Finalize);
        let finalize_outcome = FinalizeOutcome { response: last_response };
        let mut finalize_outcome = run_chain_identity(&self.finalize_middleware, finalize_outcome, &mut cx)?;
        if let Some(response) = finalize_outcome.response.as_mut() {
            response.complete();
        }

        outcome
    }

    async fn run_attempt(
        &self,
        input: &TypeErasedBox,
        cx: &mut ExecutionContext,
        last_response: &mut Option<HttpResponse>,
    ) -> Result<TypeErasedBox, OrchestratorError> {
        cx.enter_phase(Phase::Serialize);
        let builder = self
            .request_serializer
            .serialize(input, cx)
            .map_err(|e| OrchestratorError::new(Phase::Serialize, e))?;

        cx.enter_phase(Phase::Mutate);
        let builder = run_chain_identity(&self.mutate_middleware, builder, cx)?;

        let mut request = builder
            .build()
            .map_err(|e| OrchestratorError::new(Phase::Serialize, e))?;

        cx.enter_phase(Phase::Sign);
        self.signer
            .sign(&mut request, cx)
            .map_err(|e| OrchestratorError::new(Phase::Sign, e))?;

        cx.enter_phase(Phase::Transmit);
        let mut response = self
            .connection
            .call(&mut request, cx)
            .await
            .map_err(|e| OrchestratorError::new(Phase::Transmit, e))?;

        cx.enter_phase(Phase::Deserialize);
        let result = self.response_deserializer.deserialize(&mut response, cx);
        *last_response = Some(response);

        result.map_err(|error_box| {
            let message = error_box
                .downcast_ref::<BoxError>()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "modeled error response".to_string());
            OrchestratorError::new(Phase::Deserialize, DeserializeFailure(message))
        })
    }
}

#[derive(Debug)]
struct DeserializeFailure(String);

impl std::fmt::Display for DeserializeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DeserializeFailure {}

/// Classifies a phase failure into a [`smithy_types::retry::RetryReason`] for token-bucket
/// accounting, defaulting to `Transient` for failures the orchestrator itself can't
/// further distinguish (the deserializer is responsible for classifying modeled service
/// errors more precisely via `ProvideErrorKind`; this is the fallback for transport- and
/// signing-level failures).
fn classify_for_retry(error: &OrchestratorError) -> smithy_types::retry::RetryReason {
    use smithy_types::retry::RetryReason;
    match error.phase() {
        Phase::Transmit => RetryReason::Transient,
        _ => RetryReason::ServerSide,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PipelineBuilder;
    use crate::context_keys::{SigningRegion, SigningServiceName};
    use crate::signer::StandardSigner;
    use smithy_runtime_api::traits::BoxFuture;
    use smithy_types::http::{HttpBody, HttpRequest};
    use smithy_types::url::Url;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct EchoSerializer;
    impl RequestSerializer for EchoSerializer {
        fn serialize(&self, _input: &TypeErasedBox, _cx: &ExecutionContext) -> Result<HttpRequestBuilder, BoxError> {
            Ok(HttpRequestBuilder::new()
                .method("GET")
                .url(Url::parse("https://example.amazonaws.com/").unwrap()))
        }
    }

    #[derive(Debug)]
    struct EchoDeserializer;
    impl ResponseDeserializer for EchoDeserializer {
        fn deserialize(&self, response: &mut HttpResponse, _cx: &ExecutionContext) -> Result<TypeErasedBox, TypeErasedBox> {
            if response.is_success() {
                Ok(TypeErasedBox::new(response.status()))
            } else {
                Err(TypeErasedBox::new(response.status()))
            }
        }
    }

    #[derive(Debug)]
    struct FlakyConnection {
        failures_remaining: AtomicU32,
    }
    impl Connection for FlakyConnection {
        fn call<'a>(&'a self, _request: &'a mut HttpRequest, _cx: &'a ExecutionContext) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
            Box::pin(async move {
                if self.failures_remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n - 1) } else { None }).is_ok() {
                    Ok(HttpResponse::new(503, smithy_types::headers::Headers::new(), HttpBody::Empty))
                } else {
                    Ok(HttpResponse::new(200, smithy_types::headers::Headers::new(), HttpBody::Empty))
                }
            })
        }
    }

    #[derive(Debug)]
    struct AlwaysRetryOn5xx;
    impl RetryStrategy for AlwaysRetryOn5xx {
        fn should_attempt_initial_request(&self, _cx: &ExecutionContext) -> Result<(), BoxError> {
            Ok(())
        }
        fn should_attempt_retry(&self, attempt: u32, _error: &OrchestratorErrorRef<'_>, _cx: &ExecutionContext) -> Result<bool, BoxError> {
            Ok(attempt < 5)
        }
    }

    fn signer() -> StandardSigner {
        StandardSigner::new(
            aws_sigv4::Credentials::new("AKID", "SECRET", None),
            smithy_async::time::SharedTimeSource::default(),
        )
    }

    // Signing reads the region/service out of the execution context during the Sign
    // phase; every test seeds them via this Initialize-phase middleware first.
    #[derive(Debug)]
    struct SeedSigningContext;
    impl Middleware<TypeErasedBox> for SeedSigningContext {
        fn name(&self) -> &'static str {
            "seed-signing-context"
        }
        fn handle(
            &self,
            subject: TypeErasedBox,
            cx: &mut ExecutionContext,
            next: smithy_runtime_api::Next<'_, TypeErasedBox>,
        ) -> Result<TypeErasedBox, OrchestratorError> {
            cx.put(SigningRegion("us-east-1".to_string()));
            cx.put(SigningServiceName("service".to_string()));
            next.call(subject, cx)
        }
    }

    #[tokio::test]
    async fn a_successful_attempt_runs_every_phase_once() {
        let orchestrator = PipelineBuilder::new()
            .intercept_initialize(SeedSigningContext)
            .request_serializer(EchoSerializer)
            .response_deserializer(EchoDeserializer)
            .connection(FlakyConnection { failures_remaining: AtomicU32::new(0) })
            .signer(signer())
            .build()
            .unwrap();

        let result = orchestrator.invoke(TypeErasedBox::new(())).await.unwrap();
        assert_eq!(*result.downcast::<u16>().unwrap(), 200);
    }

    #[tokio::test]
    async fn retries_a_transient_failure_until_the_retry_strategy_gives_up() {
        let orchestrator = PipelineBuilder::new()
            .intercept_initialize(SeedSigningContext)
            .request_serializer(EchoSerializer)
            .response_deserializer(EchoDeserializer)
            .connection(FlakyConnection { failures_remaining: AtomicU32::new(2) })
            .signer(signer())
            .retry_strategy(AlwaysRetryOn5xx)
            .max_attempts(5)
            .build()
            .unwrap();

        let result = orchestrator.invoke(TypeErasedBox::new(())).await.unwrap();
        assert_eq!(*result.downcast::<u16>().unwrap(), 200);
    }

    #[tokio::test]
    async fn finalize_completes_a_streaming_response_body_even_on_failure() {
        #[derive(Debug)]
        struct StreamingConnection;
        impl Connection for StreamingConnection {
            fn call<'a>(&'a self, _request: &'a mut HttpRequest, _cx: &'a ExecutionContext) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
                Box::pin(async move {
                    let (writer, reader) = smithy_io::channel(1024, true);
                    drop(writer);
                    Ok(HttpResponse::new(
                        500,
                        smithy_types::headers::Headers::new(),
                        HttpBody::Streaming { reader, replayable: false },
                    ))
                })
            }
        }

        let orchestrator = PipelineBuilder::new()
            .intercept_initialize(SeedSigningContext)
            .request_serializer(EchoSerializer)
            .response_deserializer(EchoDeserializer)
            .connection(StreamingConnection)
            .signer(signer())
            .build()
            .unwrap();

        let result = orchestrator.invoke(TypeErasedBox::new(())).await;
        assert!(result.is_err());
    }
}
