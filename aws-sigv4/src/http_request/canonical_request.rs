/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Builds the SigV4 canonical request text: `METHOD\npath\nquery\nheaders\n\nsigned\nhash`.

use super::settings::{is_denied_header, SigningSettings, UriPathNormalizationMode};
use smithy_types::headers::Headers;
use smithy_types::percent_encode::{canonical_path, canonical_query_string};
use smithy_types::url::Url;

/// The result of canonicalizing a request: the text to hash and sign, plus the sorted,
/// semicolon-joined list of header names that were included (needed for both
/// `SignedHeaders` and the `Authorization` header value).
pub(crate) struct CanonicalRequest {
    pub(crate) text: String,
    pub(crate) signed_headers: String,
}

/// Builds the canonical request per the algorithm in the specification: lowercase and
/// sort signable header names, normalize header values (trim + collapse internal
/// whitespace, multi-valued headers joined with `,`), then assemble the fixed five-line
/// (plus trailing hash) text block.
pub(crate) fn build(
    method: &str,
    url: &Url,
    headers: &Headers,
    payload_hash: &str,
    settings: &SigningSettings,
) -> CanonicalRequest {
    let path = match settings.uri_path_normalization_mode {
        UriPathNormalizationMode::Enabled => normalize_path(url.path()),
        UriPathNormalizationMode::Disabled => url.path().to_string(),
    };
    let canonical_path = canonical_path(&path, settings.double_uri_encode);
    let canonical_query = canonical_query_string(url.query());

    let mut signable: Vec<(String, Vec<String>)> = Vec::new();
    for name in headers.names() {
        let lower = name.to_ascii_lowercase();
        if is_denied_header(&lower) || settings.excluded_headers.iter().any(|h| h.eq_ignore_ascii_case(&lower)) {
            continue;
        }
        let values: Vec<String> = headers.get_all(name).map(normalize_header_value).collect();
        signable.push((lower, values));
    }
    signable.sort_by(|a, b| a.0.cmp(&b.0));

    let signed_headers = signable
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let mut text = String::new();
    text.push_str(method);
    text.push('\n');
    text.push_str(&canonical_path);
    text.push('\n');
    text.push_str(&canonical_query);
    text.push('\n');
    for (name, values) in &signable {
        text.push_str(name);
        text.push(':');
        text.push_str(&values.join(","));
        text.push('\n');
    }
    text.push('\n');
    text.push_str(&signed_headers);
    text.push('\n');
    text.push_str(payload_hash);

    CanonicalRequest { text, signed_headers }
}

/// Trims a header value and collapses internal runs of whitespace to a single space.
fn normalize_header_value(value: &str) -> String {
    value.trim().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses `.` and `..` path segments the way an HTTP server's filesystem-style
/// resolution would, without ever escaping above the root (a leading `..` is dropped
/// rather than erroring, matching browser/proxy normalization behavior).
fn normalize_path(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    format!("/{}", out.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_request::settings::SignatureLocation;
    use smithy_types::url::Url;

    fn vanilla_request() -> (Url, Headers) {
        let url = Url::parse("https://example.amazonaws.com/").unwrap();
        let mut headers = Headers::new();
        headers.insert("Host", "example.amazonaws.com");
        headers.insert("X-Amz-Date", "20150830T123600Z");
        (url, headers)
    }

    #[test]
    fn matches_the_published_get_vanilla_vector() {
        let (url, headers) = vanilla_request();
        let settings = SigningSettings::default();
        let payload_hash = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let creq = build("GET", &url, &headers, payload_hash, &settings);
        let expected = "GET\n/\n\nhost:example.amazonaws.com\nx-amz-date:20150830T123600Z\n\nhost;x-amz-date\ne3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert_eq!(creq.text, expected);
        assert_eq!(creq.signed_headers, "host;x-amz-date");
    }

    #[test]
    fn excludes_the_fixed_deny_list_headers() {
        let (url, mut headers) = vanilla_request();
        headers.insert("User-Agent", "test-agent/1.0");
        headers.insert("Connection", "keep-alive");
        let settings = SigningSettings::default();
        let creq = build("GET", &url, &headers, "hash", &settings);
        assert_eq!(creq.signed_headers, "host;x-amz-date");
    }

    #[test]
    fn multi_valued_header_is_joined_with_a_comma() {
        let (url, mut headers) = vanilla_request();
        headers.append("X-Thing", "a");
        headers.append("X-Thing", "b");
        let settings = SigningSettings::default();
        let creq = build("GET", &url, &headers, "hash", &settings);
        assert!(creq.text.contains("x-thing:a,b"));
    }

    #[test]
    fn header_value_whitespace_is_collapsed() {
        let (url, mut headers) = vanilla_request();
        headers.insert("X-Spacey", "  a    b  ");
        let settings = SigningSettings::default();
        let creq = build("GET", &url, &headers, "hash", &settings);
        assert!(creq.text.contains("x-spacey:a b"));
    }

    #[test]
    fn query_signing_does_not_change_canonical_header_selection() {
        let (url, headers) = vanilla_request();
        let mut settings = SigningSettings::default();
        settings.signature_location = SignatureLocation::QueryParams;
        let creq = build("GET", &url, &headers, "hash", &settings);
        assert_eq!(creq.signed_headers, "host;x-amz-date");
    }

    #[test]
    fn disabling_path_normalization_keeps_dot_segments_literal() {
        let url = Url::parse("https://example.amazonaws.com/a/../b").unwrap();
        let mut headers = Headers::new();
        headers.insert("Host", "example.amazonaws.com");
        let mut settings = SigningSettings::default();
        settings.uri_path_normalization_mode = UriPathNormalizationMode::Disabled;
        let creq = build("GET", &url, &headers, "hash", &settings);
        assert!(creq.text.starts_with("GET\n/a/../b\n"));
    }
}
