/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Core data types shared across the Smithy client runtime.
//!
//! This crate has no knowledge of any particular protocol or transport; it defines the
//! vocabulary (`Url`, `Headers`, `QueryParameters`, `HttpRequestBuilder`, `HttpResponse`,
//! retryable-error classification) that the signer, retry strategy, and operation pipeline
//! crates build on top of.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod date_time;
pub mod error;
pub mod headers;
pub mod http;
pub mod percent_encode;
pub mod query;
pub mod retry;
pub mod url;

pub use error::BoxError;
pub use headers::Headers;
pub use http::{HttpBody, HttpRequest, HttpRequestBuilder, HttpResponse};
pub use query::QueryParameters;
pub use retry::{RetryDirective, RetryReason};
pub use url::{Host, Url};
