/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A token-oriented JSON codec: a pull-based reader, a stateful writer, and
//! descriptor-driven field dispatch, used by generated serializers/deserializers.
//! This crate has no knowledge of any particular modeled type; it only knows JSON.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod escape;

pub mod descriptor;
pub mod error;
pub mod reader;
pub mod token;
pub mod writer;

pub use descriptor::{FieldDescriptor, FieldDispatcher, FieldMatch, FieldTrait, IgnoreKey, ObjectDescriptor};
pub use error::DeserializeError;
pub use reader::JsonTokenReader;
pub use token::{JsonToken, RawJsonToken};
pub use writer::JsonValueWriter;
