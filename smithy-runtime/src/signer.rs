/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The `Sign` phase's one collaborator: mutates a request in place to add its
//! signature. `Sign` is "exclusively the signer" per spec.md §4.1 — no user middleware
//! runs in this phase.

use crate::context_keys::{SigningRegion, SigningServiceName};
use aws_sigv4::http_request::sign::{sign_v4, SignableBody};
use aws_sigv4::http_request::settings::SigningSettings;
use aws_sigv4::Credentials;
use smithy_async::time::SharedTimeSource;
use smithy_runtime_api::ExecutionContext;
use smithy_types::error::BoxError;
use smithy_types::http::HttpRequest;
use std::fmt::Debug;

/// Computes and applies a request signature, run during the `Sign` phase.
pub trait Signer: Send + Sync + Debug {
    /// Signs `request` in place.
    fn sign(&self, request: &mut HttpRequest, cx: &ExecutionContext) -> Result<(), BoxError>;
}

/// A [`Signer`] backed by [`aws_sigv4`]'s SigV4 implementation. Reads the credentials,
/// region, and service name it needs from the [`ExecutionContext`], so a single
/// `StandardSigner` instance can sign every attempt of every operation a client makes
/// without being reconstructed per call.
#[derive(Debug)]
pub struct StandardSigner {
    credentials: Credentials,
    time_source: SharedTimeSource,
    settings: SigningSettings,
}

impl StandardSigner {
    /// Creates a signer using `credentials` for every request it signs, reading the
    /// current time from `time_source` (inject a manual clock in tests for reproducible
    /// signatures).
    pub fn new(credentials: Credentials, time_source: SharedTimeSource) -> Self {
        Self {
            credentials,
            time_source,
            settings: SigningSettings::default(),
        }
    }

    /// Overrides the default signing settings (payload checksum behavior, signature
    /// location).
    pub fn with_settings(mut self, settings: SigningSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl Signer for StandardSigner {
    fn sign(&self, request: &mut HttpRequest, cx: &ExecutionContext) -> Result<(), BoxError> {
        let region = cx
            .get::<SigningRegion>()
            .ok_or_else(|| -> BoxError { "signing region was not set in the execution context".into() })?;
        let service = cx
            .get::<SigningServiceName>()
            .ok_or_else(|| -> BoxError { "signing service name was not set in the execution context".into() })?;

        let body_bytes = match request.body() {
            smithy_types::http::HttpBody::Bytes(b) => b.clone(),
            smithy_types::http::HttpBody::Empty => bytes::Bytes::new(),
            smithy_types::http::HttpBody::Streaming { .. } => bytes::Bytes::new(),
        };
        let signable_body = if matches!(request.body(), smithy_types::http::HttpBody::Streaming { .. }) {
            SignableBody::UnsignedPayload
        } else {
            SignableBody::Bytes(&body_bytes)
        };

        sign_v4(
            request,
            &self.credentials,
            &region.0,
            &service.0,
            self.time_source.now(),
            signable_body,
            &self.settings,
        )
        .map_err(|e| Box::new(e) as BoxError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_runtime_api::ExecutionContext;
    use smithy_types::http::HttpRequestBuilder;
    use smithy_types::url::Url;

    #[test]
    fn signs_a_request_using_credentials_and_region_from_the_context() {
        let signer = StandardSigner::new(
            Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", None),
            SharedTimeSource::default(),
        );
        let mut cx = ExecutionContext::new();
        cx.put(SigningRegion("us-east-1".to_string()));
        cx.put(SigningServiceName("service".to_string()));

        let mut request = HttpRequestBuilder::new()
            .method("GET")
            .url(Url::parse("https://example.amazonaws.com/").unwrap())
            .build()
            .unwrap();

        signer.sign(&mut request, &cx).unwrap();
        assert!(request.headers().get("authorization").is_some());
    }

    #[test]
    fn fails_when_the_context_is_missing_a_signing_region() {
        let signer = StandardSigner::new(Credentials::new("AKID", "SECRET", None), SharedTimeSource::default());
        let cx = ExecutionContext::new();
        let mut request = HttpRequestBuilder::new()
            .method("GET")
            .url(Url::parse("https://example.amazonaws.com/").unwrap())
            .build()
            .unwrap();
        assert!(signer.sign(&mut request, &cx).is_err());
    }
}
