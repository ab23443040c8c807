/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Named percent-encoding schemes for the textual components of a [`crate::Url`].
//!
//! Each scheme is an allow-list of characters that pass through unencoded; everything else
//! is percent-encoded. The schemes mirror the way AWS SigV4 and Smithy's URI-template
//! resolution treat different URL components differently: a `/` is a meaningful separator
//! in a path but must be encoded inside a single path *segment*, userinfo, or query value.

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, CONTROLS};

/// Named allow-list of characters that are left unencoded by a given URL component.
///
/// See §3/§6 of the specification this crate implements: every textual URL component
/// carries an `(decoded, encoded)` pair under one of these schemes, and
/// `encode(decode(x)) == x` holds for canonical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PercentEncoding {
    /// Host component of a URL. Hostnames rarely need encoding; only disallowed control
    /// and whitespace bytes are escaped.
    Host,
    /// The `user[:password]` portion preceding `@` in a URL authority.
    UserInfo,
    /// A single path segment (the `/` separator itself is handled by the caller, not by
    /// this scheme — encoding a segment that itself contains `/` will escape it).
    Path,
    /// A single query-string key or value, RFC 3986 `query` production.
    Query,
    /// The fragment following `#`.
    Fragment,
    /// `application/x-www-form-urlencoded` — space becomes `+`, used for request bodies
    /// carrying form-encoded parameters (SigV4 scenario 2).
    FormUrl,
    /// Smithy `{label}`/`{label+}` URI template substitution: encode everything that is
    /// not unreserved, including `/` (non-greedy labels) or preserve `/` (greedy labels).
    /// This variant always encodes `/`; use [`PercentEncoding::Path`] to preserve it.
    SmithyLabel,
    /// The restrictive "unreserved characters only" table used by SigV4 canonical-query
    /// and canonical-path encoding: `A-Za-z0-9-_.~` pass through, everything else
    /// (including `/`) is percent-encoded, uppercase hex digits.
    SigV4,
}

const UNRESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'@')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'&')
    .add(b'+')
    .add(b'$')
    .add(b',')
    .add(b'!')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*');

const HOST_SET: &AsciiSet = &CONTROLS.add(b' ');

const USERINFO_SET: &AsciiSet = &UNRESERVED.remove(b':');

const PATH_SEGMENT_SET: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

const QUERY_SET: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b',')
    .remove(b';')
    .remove(b'/')
    .remove(b'?');

const FRAGMENT_SET: &AsciiSet = QUERY_SET;

const FORM_URL_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'&')
    .add(b'=')
    .add(b'+');

/// Unreserved-only, as SigV4 requires: `A-Za-z0-9-_.~`.
const SIGV4_SET: &AsciiSet = &UNRESERVED.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

const SMITHY_LABEL_SET: &AsciiSet = SIGV4_SET;

impl PercentEncoding {
    fn ascii_set(self) -> &'static AsciiSet {
        match self {
            PercentEncoding::Host => HOST_SET,
            PercentEncoding::UserInfo => USERINFO_SET,
            PercentEncoding::Path => PATH_SEGMENT_SET,
            PercentEncoding::Query => QUERY_SET,
            PercentEncoding::Fragment => FRAGMENT_SET,
            PercentEncoding::FormUrl => FORM_URL_SET,
            PercentEncoding::SmithyLabel => SMITHY_LABEL_SET,
            PercentEncoding::SigV4 => SIGV4_SET,
        }
    }

    /// Percent-encodes `decoded` under this scheme.
    pub fn encode(self, decoded: &str) -> String {
        if self == PercentEncoding::FormUrl {
            // application/x-www-form-urlencoded uses `+` for space rather than `%20`.
            return percent_encode(decoded.as_bytes(), self.ascii_set())
                .to_string()
                .replace("%20", "+");
        }
        percent_encode(decoded.as_bytes(), self.ascii_set()).to_string()
    }

    /// Percent-decodes `encoded`, which is assumed to have been produced under this scheme.
    /// Decoding is scheme-independent (percent-triplets always mean the same thing); the
    /// scheme parameter exists for symmetry with [`PercentEncoding::encode`] and to handle
    /// `+` as space for [`PercentEncoding::FormUrl`].
    pub fn decode(self, encoded: &str) -> String {
        if self == PercentEncoding::FormUrl {
            let swapped = encoded.replace('+', " ");
            return percent_decode_str(&swapped).decode_utf8_lossy().into_owned();
        }
        percent_decode_str(encoded).decode_utf8_lossy().into_owned()
    }
}

/// A decoded/encoded pair produced by a single [`PercentEncoding`] scheme.
///
/// Invariant: `encode(decoded, scheme) == encoded`. Constructing an `Encodable` always
/// derives one member from the other so the invariant cannot be violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encodable {
    decoded: String,
    encoded: String,
    scheme: PercentEncoding,
}

impl Encodable {
    /// Builds an `Encodable` from an already-decoded value, computing its encoded form.
    pub fn from_decoded(decoded: impl Into<String>, scheme: PercentEncoding) -> Self {
        let decoded = decoded.into();
        let encoded = scheme.encode(&decoded);
        Self {
            decoded,
            encoded,
            scheme,
        }
    }

    /// Builds an `Encodable` from an already-encoded value, computing its decoded form.
    pub fn from_encoded(encoded: impl Into<String>, scheme: PercentEncoding) -> Self {
        let encoded = encoded.into();
        let decoded = scheme.decode(&encoded);
        Self {
            decoded,
            encoded,
            scheme,
        }
    }

    /// The decoded textual value.
    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    /// The percent-encoded textual value.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The scheme this pair was produced under.
    pub fn scheme(&self) -> PercentEncoding {
        self.scheme
    }
}

/// Builds the SigV4 canonical query string: every key and value percent-encoded under the
/// restrictive [`PercentEncoding::SigV4`] table, then sorted by encoded key and, for ties,
/// by encoded value, and joined with `&`/`=`. This is distinct from
/// [`crate::query::QueryParameters::to_query_string`], which preserves insertion order for
/// ordinary request construction.
pub fn canonical_query_string(params: &crate::query::QueryParameters) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                PercentEncoding::SigV4.encode(k),
                PercentEncoding::SigV4.encode(v),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Applies [`PercentEncoding::SigV4`] to each `/`-delimited path segment while preserving
/// the separators, i.e. the RFC 3986 path encoding the SigV4 canonical request needs.
/// When `double_encode` is set, the already-encoded path is passed through the SigV4 table
/// a second time (re-encoding the literal `%` characters), which is what S3 and a handful
/// of other services require (`useDoubleUriEncode`).
pub fn canonical_path(path: &str, double_encode: bool) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let once: String = path
        .split('/')
        .map(|segment| PercentEncoding::SigV4.encode(segment))
        .collect::<Vec<_>>()
        .join("/");
    if double_encode {
        PercentEncoding::SigV4.encode(&once)
    } else {
        once
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryParameters;

    #[test]
    fn sigv4_scheme_only_passes_unreserved() {
        assert_eq!(PercentEncoding::SigV4.encode("a-Z_0.9~"), "a-Z_0.9~");
        assert_eq!(PercentEncoding::SigV4.encode("/"), "%2F");
        assert_eq!(PercentEncoding::SigV4.encode(" "), "%20");
    }

    #[test]
    fn round_trip_holds_for_canonical_inputs() {
        for scheme in [
            PercentEncoding::Host,
            PercentEncoding::UserInfo,
            PercentEncoding::Path,
            PercentEncoding::Query,
            PercentEncoding::Fragment,
            PercentEncoding::FormUrl,
            PercentEncoding::SmithyLabel,
            PercentEncoding::SigV4,
        ] {
            let decoded = "hello world/=&?#:@ünïcode";
            let encoded = scheme.encode(decoded);
            assert_eq!(scheme.decode(&encoded), decoded, "scheme {scheme:?}");
        }
    }

    #[test]
    fn canonical_query_string_sorts_by_encoded_key_then_value() {
        let mut params = QueryParameters::new();
        params.append("b", "2");
        params.append("a", "2");
        params.append("a", "1");
        assert_eq!(canonical_query_string(&params), "a=1&a=2&b=2");
    }

    #[test]
    fn canonical_path_encodes_segments_not_separators() {
        assert_eq!(canonical_path("/a b/c", false), "/a%20b/c");
    }

    #[test]
    fn double_encode_escapes_percent_signs_again() {
        assert_eq!(canonical_path("/a b", true), "/a%2520b");
    }
}
