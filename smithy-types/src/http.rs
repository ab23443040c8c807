/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! HTTP request and response value types: a builder for outgoing requests, an immutable
//! response, and a body type polymorphic over empty/buffered/streaming.

use crate::error::BuildError;
use crate::headers::Headers;
use crate::url::Url;
use smithy_io::Reader;
use std::fmt;

/// A request or response body: either empty, fully buffered, or a live streaming
/// channel.
///
/// Streaming bodies are not inherently replayable; [`HttpBody::replayable`] tells callers
/// (notably the signer, which must hash the payload) whether `reset` followed by a second
/// full read will reproduce the same bytes.
pub enum HttpBody {
    /// No body at all, distinct from a zero-length buffered body for protocols that
    /// treat the two differently (e.g. omitting `Content-Length`).
    Empty,
    /// A body fully held in memory.
    Bytes(bytes::Bytes),
    /// A body delivered incrementally over a [`smithy_io::channel`] reader.
    Streaming {
        /// The read half of the channel carrying the body bytes.
        reader: Reader,
        /// Whether the producer can be asked to replay the same bytes from the start
        /// (true for file-backed or re-creatable streams, false for one-shot network
        /// sources).
        replayable: bool,
    },
}

impl HttpBody {
    /// `true` for [`HttpBody::Empty`] and zero-length [`HttpBody::Bytes`].
    pub fn is_empty(&self) -> bool {
        match self {
            HttpBody::Empty => true,
            HttpBody::Bytes(b) => b.is_empty(),
            HttpBody::Streaming { .. } => false,
        }
    }

    /// The body length in bytes, if known without consuming it. Streaming bodies report
    /// `None` since their length is not known until fully read.
    pub fn content_length(&self) -> Option<u64> {
        match self {
            HttpBody::Empty => Some(0),
            HttpBody::Bytes(b) => Some(b.len() as u64),
            HttpBody::Streaming { .. } => None,
        }
    }

    /// Whether hashing this body and re-reading it from the start would reproduce the
    /// same bytes, required by the signer before it will compute a payload hash over a
    /// streaming body.
    pub fn replayable(&self) -> bool {
        match self {
            HttpBody::Empty | HttpBody::Bytes(_) => true,
            HttpBody::Streaming { replayable, .. } => *replayable,
        }
    }
}

impl fmt::Debug for HttpBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpBody::Empty => write!(f, "HttpBody::Empty"),
            HttpBody::Bytes(b) => write!(f, "HttpBody::Bytes({} bytes)", b.len()),
            HttpBody::Streaming { replayable, .. } => {
                write!(f, "HttpBody::Streaming {{ replayable: {replayable} }}")
            }
        }
    }
}

/// An outgoing HTTP request under construction. Every field has a sensible builder
/// method; [`build`](HttpRequestBuilder::build) validates that a method and URL were set.
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
    method: Option<String>,
    url: Option<Url>,
    headers: Headers,
    body: Option<HttpBody>,
}

impl HttpRequestBuilder {
    /// Starts an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method, e.g. `"POST"`.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the target URL.
    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Appends a header, keeping any existing values for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces every value for `name` with a single header.
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Direct mutable access to the headers under construction, for middleware that
    /// needs to inspect or bulk-modify what's already set.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Sets the body.
    pub fn body(mut self, body: HttpBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Validates and finalizes the request. Fails if no method or URL was set.
    pub fn build(self) -> Result<HttpRequest, BuildError> {
        let method = self
            .method
            .ok_or_else(|| BuildError::new("HTTP method is required"))?;
        let url = self.url.ok_or_else(|| BuildError::new("URL is required"))?;
        Ok(HttpRequest {
            method,
            url,
            headers: self.headers,
            body: self.body.unwrap_or(HttpBody::Empty),
        })
    }
}

/// A fully constructed outgoing HTTP request.
#[derive(Debug)]
pub struct HttpRequest {
    method: String,
    url: Url,
    headers: Headers,
    body: HttpBody,
}

impl HttpRequest {
    /// The HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The target URL, mutably — used by middleware that rewrites the endpoint or
    /// appends query parameters (e.g. pre-signed URL signing).
    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    /// The request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The request headers, mutably.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// The request body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Replaces the body, returning the previous one (used when a streaming body is
    /// consumed and replaced by its buffered replay for signing).
    pub fn replace_body(&mut self, body: HttpBody) -> HttpBody {
        std::mem::replace(&mut self.body, body)
    }

    /// Converts back into a builder, e.g. to clone-and-modify for a retry attempt over
    /// a non-replayable body that has already been buffered.
    pub fn into_builder(self) -> HttpRequestBuilder {
        HttpRequestBuilder {
            method: Some(self.method),
            url: Some(self.url),
            headers: self.headers,
            body: Some(self.body),
        }
    }
}

/// An immutable HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    status: u16,
    headers: Headers,
    body: HttpBody,
}

impl HttpResponse {
    /// Constructs a response from its parts.
    pub fn new(status: u16, headers: Headers, body: HttpBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// `true` for status codes in `200..300`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The response body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Takes ownership of the body, leaving [`HttpBody::Empty`] in its place.
    pub fn take_body(&mut self) -> HttpBody {
        std::mem::replace(&mut self.body, HttpBody::Empty)
    }

    /// Cancels a streaming body to release its underlying connection without reading
    /// the rest of it; a no-op for `Empty`/`Bytes` bodies. Every response body must
    /// either be fully consumed or explicitly completed, and the orchestrator's
    /// Finalize phase calls this automatically on the default path.
    pub fn complete(&mut self) {
        if let HttpBody::Streaming { reader, .. } = &mut self.body {
            reader.cancel(None);
        }
        self.body = HttpBody::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_method_and_url() {
        let err = HttpRequestBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("method"));
    }

    #[test]
    fn builder_produces_a_request() {
        let req = HttpRequestBuilder::new()
            .method("POST")
            .url(Url::parse("https://example.amazonaws.com/").unwrap())
            .header("content-type", "application/json")
            .body(HttpBody::Bytes(bytes::Bytes::from_static(b"{}")))
            .build()
            .unwrap();
        assert_eq!(req.method(), "POST");
        assert_eq!(req.headers().get("content-type"), Some("application/json"));
        assert_eq!(req.body().content_length(), Some(2));
    }

    #[test]
    fn empty_body_reports_zero_length_and_is_replayable() {
        let body = HttpBody::Empty;
        assert!(body.is_empty());
        assert!(body.replayable());
        assert_eq!(body.content_length(), Some(0));
    }

    #[test]
    fn response_success_range() {
        let resp = HttpResponse::new(204, Headers::new(), HttpBody::Empty);
        assert!(resp.is_success());
        let resp = HttpResponse::new(503, Headers::new(), HttpBody::Empty);
        assert!(!resp.is_success());
    }

    #[test]
    fn complete_cancels_a_streaming_body() {
        let (w, r) = smithy_io::channel(1024, true);
        drop(w);
        let mut resp = HttpResponse::new(
            200,
            Headers::new(),
            HttpBody::Streaming {
                reader: r,
                replayable: false,
            },
        );
        resp.complete();
        assert!(matches!(resp.body(), HttpBody::Empty));
    }
}
