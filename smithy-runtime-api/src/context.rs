/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A mutable, keyed attribute bag scoped to one operation invocation, carrying resolved
//! credentials, endpoint, signing parameters, and arbitrary per-middleware state between
//! phases.

use crate::phase::Phase;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

struct Slot {
    /// The phase active when this value was written, or `None` if it was written before
    /// the pipeline started running (e.g. by the client builder at construction time).
    written_during: Option<Phase>,
    value: Box<dyn Any + Send + Sync>,
}

/// Keyed, heterogeneous attribute storage for one operation invocation. Values are keyed
/// by their Rust type; storing a second value of the same type overwrites the first.
///
/// Visibility invariant: a value written before the pipeline starts (`written_during:
/// None`) is visible from every phase. A value written during phase `P` is visible only
/// from phases strictly after `P` — not from `P` itself, and not from any earlier phase —
/// matching the contract that later writes are visible to *subsequent* phases only.
#[derive(Default)]
pub struct ExecutionContext {
    current_phase: Option<Phase>,
    slots: HashMap<TypeId, Slot>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("current_phase", &self.current_phase)
            .field("slot_count", &self.slots.len())
            .finish()
    }
}

impl ExecutionContext {
    /// Creates an empty context, as when an operation invocation begins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the orchestrator when it begins running `phase`. Determines which
    /// previously-written values become visible to the middleware running in it.
    pub fn enter_phase(&mut self, phase: Phase) {
        self.current_phase = Some(phase);
    }

    /// Stores `value`, keyed by its type. If called before [`enter_phase`] has ever been
    /// called, the value is treated as pre-pipeline configuration and is visible from
    /// every phase.
    pub fn put<T: Send + Sync + 'static>(&mut self, value: T) {
        let written_during = self.current_phase;
        self.slots.insert(
            TypeId::of::<T>(),
            Slot {
                written_during,
                value: Box::new(value),
            },
        );
    }

    /// Returns the stored value of type `T`, if one exists and is visible from the
    /// current phase.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        let slot = self.slots.get(&TypeId::of::<T>())?;
        if !self.visible(slot) {
            return None;
        }
        slot.value.downcast_ref()
    }

    /// Returns a mutable reference to the stored value of type `T`, if one exists and is
    /// visible from the current phase.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let visible = self.slots.get(&TypeId::of::<T>()).is_some_and(|s| self.visible(s));
        if !visible {
            return None;
        }
        self.slots.get_mut(&TypeId::of::<T>())?.value.downcast_mut()
    }

    fn visible(&self, slot: &Slot) -> bool {
        match (slot.written_during, self.current_phase) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(written), Some(current)) => written < current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_value_written_before_the_pipeline_starts_is_visible_everywhere() {
        let mut cx = ExecutionContext::new();
        cx.put(42u32);
        cx.enter_phase(Phase::Initialize);
        assert_eq!(cx.get::<u32>(), Some(&42));
        cx.enter_phase(Phase::Finalize);
        assert_eq!(cx.get::<u32>(), Some(&42));
    }

    #[test]
    fn a_value_written_during_a_phase_is_invisible_to_that_same_phase() {
        let mut cx = ExecutionContext::new();
        cx.enter_phase(Phase::Serialize);
        cx.put("endpoint".to_string());
        assert_eq!(cx.get::<String>(), None);
    }

    #[test]
    fn a_value_written_during_a_phase_becomes_visible_to_later_phases() {
        let mut cx = ExecutionContext::new();
        cx.enter_phase(Phase::Serialize);
        cx.put("endpoint".to_string());
        cx.enter_phase(Phase::Mutate);
        assert_eq!(cx.get::<String>().map(String::as_str), Some("endpoint"));
    }

    #[test]
    fn a_value_written_during_a_phase_is_invisible_to_an_earlier_phase() {
        // This only matters if a single context instance were reused backwards, which
        // the orchestrator never does, but the accessor must still honor the invariant.
        let mut cx = ExecutionContext::new();
        cx.enter_phase(Phase::Sign);
        cx.put(7i32);
        cx.enter_phase(Phase::Initialize);
        assert_eq!(cx.get::<i32>(), None);
    }

    #[test]
    fn get_mut_respects_the_same_visibility_rule() {
        let mut cx = ExecutionContext::new();
        cx.put(1u64);
        cx.enter_phase(Phase::Transmit);
        *cx.get_mut::<u64>().unwrap() += 1;
        assert_eq!(cx.get::<u64>(), Some(&2));
    }
}
