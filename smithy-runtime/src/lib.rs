/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The phased middleware executor: composes a request serializer, signer, connection,
//! response deserializer, and retry strategy (all from `smithy-runtime-api`) into a
//! single operation invocation that runs the fixed
//! Initialize→Serialize→Mutate→Sign→Transmit→Deserialize→Finalize sequence.

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod chain;
pub mod builder;
pub mod context_keys;
pub mod orchestrator;
pub mod signer;

pub use builder::PipelineBuilder;
pub use orchestrator::{FinalizeOutcome, Orchestrator};
pub use signer::Signer;
