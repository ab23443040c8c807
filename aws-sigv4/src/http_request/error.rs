/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Errors produced while canonicalizing or signing an HTTP request.

use std::error::Error;
use std::fmt;

#[derive(Debug)]
enum SigningErrorKind {
    UnreplayableStreamingBody,
    Sigv4aKeyDerivationExhausted,
    MissingAuthority,
}

/// Error produced by [`crate::http_request::sign_v4`] or
/// [`crate::http_request::sign_v4a`].
#[derive(Debug)]
pub struct SigningError {
    kind: SigningErrorKind,
}

impl SigningError {
    pub(crate) fn unreplayable_streaming_body() -> Self {
        Self {
            kind: SigningErrorKind::UnreplayableStreamingBody,
        }
    }

    pub(crate) fn missing_authority() -> Self {
        Self {
            kind: SigningErrorKind::MissingAuthority,
        }
    }

    /// Signals that SigV4a key derivation exhausted its loop counter without finding a
    /// valid candidate scalar. In practice this cannot happen; it's surfaced as a
    /// recoverable error rather than a panic because it depends on externally supplied
    /// credential material.
    pub fn sigv4a_key_derivation_exhausted() -> Self {
        Self {
            kind: SigningErrorKind::Sigv4aKeyDerivationExhausted,
        }
    }
}

impl fmt::Display for SigningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SigningErrorKind::UnreplayableStreamingBody => write!(
                f,
                "cannot sign a streaming body that is not replayable without a precomputed or unsigned payload hash"
            ),
            SigningErrorKind::Sigv4aKeyDerivationExhausted => {
                write!(f, "SigV4a signing key derivation exhausted its counter")
            }
            SigningErrorKind::MissingAuthority => {
                write!(f, "request URL has no host to sign")
            }
        }
    }
}

impl Error for SigningError {}
