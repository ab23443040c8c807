/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The fixed phase sequence every operation pipeline runs through.

/// A named position in the operation execution pipeline, holding an ordered middleware
/// list. The sequence is fixed and total-ordered: `Initialize < Serialize < Mutate < Sign
/// < Transmit < Deserialize < Finalize`. [`ExecutionContext`](crate::ExecutionContext)
/// visibility and retry-boundary logic both rely on this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum Phase {
    /// Runs before serialization; populates context with per-operation config (expected
    /// status, resolved endpoint parameters) that later phases read.
    Initialize,
    /// Converts the caller-typed input into an [`HttpRequestBuilder`](smithy_types::http::HttpRequestBuilder).
    Serialize,
    /// User interceptors modify the request under construction (e.g. user-agent
    /// injection, custom headers). Runs once per attempt, before signing.
    Mutate,
    /// Exclusively the signer: computes and applies the request signature.
    Sign,
    /// Exclusively the transport: sends the request and receives the raw response.
    Transmit,
    /// Converts the raw response into the modeled output or a modeled error.
    Deserialize,
    /// Cleans up resources and completes the response, on both the success and failure
    /// path. Runs exactly once per operation invocation, not per attempt.
    Finalize,
}

impl Phase {
    /// All phases in pipeline order.
    pub const ALL: [Phase; 7] = [
        Phase::Initialize,
        Phase::Serialize,
        Phase::Mutate,
        Phase::Sign,
        Phase::Transmit,
        Phase::Deserialize,
        Phase::Finalize,
    ];

    /// The phase that runs immediately after this one, or `None` after `Finalize`.
    pub fn next(self) -> Option<Phase> {
        let idx = Self::ALL.iter().position(|p| *p == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// A short, lowercase name suitable for log fields (`phase = "serialize"`).
    pub fn name(self) -> &'static str {
        match self {
            Phase::Initialize => "initialize",
            Phase::Serialize => "serialize",
            Phase::Mutate => "mutate",
            Phase::Sign => "sign",
            Phase::Transmit => "transmit",
            Phase::Deserialize => "deserialize",
            Phase::Finalize => "finalize",
        }
    }

    /// Whether an attempt retried after failing in this phase should re-run from
    /// `Serialize` (every phase except `Initialize`, which only ever runs once per
    /// operation, and `Finalize`, which never triggers a retry itself).
    pub fn restarts_from_serialize_on_retry(self) -> bool {
        !matches!(self, Phase::Initialize | Phase::Finalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_totally_ordered_in_pipeline_sequence() {
        assert!(Phase::Initialize < Phase::Serialize);
        assert!(Phase::Serialize < Phase::Mutate);
        assert!(Phase::Mutate < Phase::Sign);
        assert!(Phase::Sign < Phase::Transmit);
        assert!(Phase::Transmit < Phase::Deserialize);
        assert!(Phase::Deserialize < Phase::Finalize);
    }

    #[test]
    fn next_walks_the_fixed_sequence_and_ends_at_finalize() {
        assert_eq!(Phase::Initialize.next(), Some(Phase::Serialize));
        assert_eq!(Phase::Finalize.next(), None);
    }

    #[test]
    fn only_initialize_and_finalize_are_excluded_from_retry_restart() {
        assert!(!Phase::Initialize.restarts_from_serialize_on_retry());
        assert!(!Phase::Finalize.restarts_from_serialize_on_retry());
        assert!(Phase::Serialize.restarts_from_serialize_on_retry());
        assert!(Phase::Sign.restarts_from_serialize_on_retry());
    }
}
