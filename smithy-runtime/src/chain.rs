/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Composes an ordered middleware list into a single call, in registration order (the
//! "before" list runs outermost-first, the "after" list runs innermost-first, matching
//! spec.md §4.1's "before-list reversed, then after-list" contract) around a terminal
//! step.

use smithy_runtime_api::{ExecutionContext, Middleware, Next, OrchestratorError};

/// Runs `subject` through `middlewares[idx..]`, then `terminal`, recursing one
/// middleware at a time so each sees the transformed result of everything before it.
pub fn run_chain<S>(
    middlewares: &[Box<dyn Middleware<S>>],
    idx: usize,
    subject: S,
    cx: &mut ExecutionContext,
    terminal: &mut dyn FnMut(S, &mut ExecutionContext) -> Result<S, OrchestratorError>,
) -> Result<S, OrchestratorError> {
    match middlewares.get(idx) {
        None => terminal(subject, cx),
        Some(mw) => {
            let mut next_step = |s: S, cx: &mut ExecutionContext| run_chain(middlewares, idx + 1, s, cx, terminal);
            mw.handle(subject, cx, Next::new(&mut next_step))
        }
    }
}

/// Convenience entry point for a chain with no transformation expected from the
/// terminal step (the common case: the terminal just returns the subject unchanged,
/// having already been mutated in place by the middleware before it).
pub fn run_chain_identity<S>(middlewares: &[Box<dyn Middleware<S>>], subject: S, cx: &mut ExecutionContext) -> Result<S, OrchestratorError> {
    run_chain(middlewares, 0, subject, cx, &mut |s, _| Ok(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Append(&'static str);
    impl Middleware<String> for Append {
        fn name(&self) -> &'static str {
            "append"
        }
        fn handle(&self, subject: String, cx: &mut ExecutionContext, next: Next<'_, String>) -> Result<String, OrchestratorError> {
            next.call(subject + self.0, cx)
        }
    }

    #[test]
    fn middleware_runs_in_registration_order() {
        let mws: Vec<Box<dyn Middleware<String>>> = vec![Box::new(Append("a")), Box::new(Append("b"))];
        let mut cx = ExecutionContext::new();
        let result = run_chain_identity(&mws, String::new(), &mut cx).unwrap();
        assert_eq!(result, "ab");
    }

    #[test]
    fn an_empty_chain_runs_the_terminal_directly() {
        let mws: Vec<Box<dyn Middleware<String>>> = Vec::new();
        let mut cx = ExecutionContext::new();
        let result = run_chain_identity(&mws, "unchanged".to_string(), &mut cx).unwrap();
        assert_eq!(result, "unchanged");
    }
}
