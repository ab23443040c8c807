/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Vocabulary shared between the phased middleware executor (`smithy-runtime`) and the
//! collaborators it wires together: the fixed phase sequence, the per-operation execution
//! context, the `Middleware` seam every phase is built from, and the traits a protocol/
//! transport implementation fulfills (request serializer, response deserializer,
//! connection, retry strategy).

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod context;
pub mod error;
pub mod middleware;
pub mod phase;
pub mod traits;
pub mod type_erased;

pub use context::ExecutionContext;
pub use error::OrchestratorError;
pub use middleware::{Middleware, Next};
pub use phase::Phase;
pub use type_erased::TypeErasedBox;
