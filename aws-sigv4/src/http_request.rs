/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! SigV4/SigV4a signing of HTTP requests: canonicalization, signing entry points, and
//! the settings that control checksum and presigned-URL behavior.

pub mod canonical_request;
pub mod error;
pub mod settings;
pub mod sign;

pub use error::SigningError;
pub use settings::{PayloadChecksumKind, SignatureLocation, SigningSettings};
pub use sign::{sign_v4, SignableBody};

#[cfg(feature = "sigv4a")]
pub use sign::sign_v4a;
