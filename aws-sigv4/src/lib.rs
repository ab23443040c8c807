/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! SigV4 and SigV4a request signing.
//!
//! The signer is a three-stage pipeline: canonicalize the request, derive a signing key
//! from a set of credentials, then sign the canonical request's string-to-sign and mutate
//! the request with the result (either an `Authorization` header or pre-signed query
//! parameters). [`http_request::sign`] is the entry point generated operation middleware
//! calls during the orchestrator's Sign phase.

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

use std::fmt;
use std::time::SystemTime;

pub mod chunk;
pub mod http_request;
pub mod sign;

#[cfg(feature = "sigv4a")]
pub mod event_stream;

/// The long-term or temporary AWS credentials used to derive a signing key.
///
/// This is deliberately a plain value type rather than a trait object: the signer has no
/// need to know how credentials were resolved (environment, profile, STS, IMDS), only their
/// final form. Resolving credentials and caching them across requests is the identity
/// resolver's job, upstream of signing.
#[derive(Clone)]
#[non_exhaustive]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    expiration: Option<SystemTime>,
}

impl Credentials {
    /// Creates a new set of non-expiring credentials.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
            expiration: None,
        }
    }

    /// Creates a new set of credentials that expire at `expiration`.
    pub fn new_expiring(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
        expiration: SystemTime,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
            expiration: Some(expiration),
        }
    }

    /// The access key ID, e.g. `AKIDEXAMPLE`.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret access key used to derive the signing key. Never logged.
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// The session token accompanying temporary credentials, if any.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// The instant after which these credentials are no longer valid, if they expire.
    pub fn expiration(&self) -> Option<SystemTime> {
        self.expiration
    }

    /// Whether these credentials have expired as of `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expiration.is_some_and(|exp| now >= exp)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Container for a signed output and the raw signature that produced it.
///
/// This is returned by the signing functions; the signed output differs by what is being
/// signed (an HTTP request, an event-stream message, a chunk).
#[derive(Debug)]
pub struct SigningOutput<T> {
    output: T,
    signature: String,
}

impl<T> SigningOutput<T> {
    /// Creates a new `SigningOutput`.
    pub fn new(output: T, signature: String) -> Self {
        Self { output, signature }
    }

    /// The signed output.
    pub fn output(&self) -> &T {
        &self.output
    }

    /// The signature, as a lowercase hex string.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Decomposes into the signed output and the signature.
    pub fn into_parts(self) -> (T, String) {
        (self.output, self.signature)
    }
}
