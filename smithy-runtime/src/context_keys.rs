/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Typed keys for values stored in [`smithy_runtime_api::ExecutionContext`] that this
//! crate's collaborators (chiefly [`crate::signer::StandardSigner`]) read. Newtypes
//! rather than bare `String`/`SystemTime`, since the context bag is keyed by Rust type
//! and two unrelated `String` values would otherwise collide.

/// The signing region, e.g. `"us-east-1"` (or a comma-separated region set for SigV4a).
#[derive(Debug, Clone)]
pub struct SigningRegion(pub String);

/// The signing service name, e.g. `"s3"`.
#[derive(Debug, Clone)]
pub struct SigningServiceName(pub String);

/// The expected successful HTTP status code(s), set during `Initialize` and read by the
/// response deserializer during `Deserialize`. `None` means any `2xx` is acceptable.
#[derive(Debug, Clone, Copy)]
pub struct ExpectedStatus(pub Option<u16>);
