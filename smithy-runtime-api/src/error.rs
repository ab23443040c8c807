/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The orchestrator's error type: any phase failure, tagged with the phase it occurred in.

use crate::phase::Phase;
use smithy_types::error::BoxError;
use std::fmt;

/// Wraps any failure raised by a phase's middleware or collaborator, carrying the phase
/// it occurred in so the retry strategy and logging can attribute it correctly. The retry
/// strategy is the only component permitted to transform an `OrchestratorError` into a
/// retry decision; every other component propagates it unchanged.
#[derive(Debug)]
pub struct OrchestratorError {
    phase: Phase,
    source: BoxError,
}

impl OrchestratorError {
    /// Creates a new error attributing `source` to `phase`.
    pub fn new(phase: Phase, source: impl Into<BoxError>) -> Self {
        Self {
            phase,
            source: source.into(),
        }
    }

    /// The phase in which the failure occurred.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The underlying failure.
    pub fn source_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation failed during the {} phase: {}", self.phase.name(), self.source)
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;
    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }
    impl std::error::Error for Boom {}

    #[test]
    fn display_includes_the_phase_name() {
        let err = OrchestratorError::new(Phase::Sign, Boom);
        assert_eq!(err.to_string(), "operation failed during the sign phase: boom");
    }

    #[test]
    fn phase_accessor_reports_where_the_failure_happened() {
        let err = OrchestratorError::new(Phase::Transmit, Boom);
        assert_eq!(err.phase(), Phase::Transmit);
    }
}
