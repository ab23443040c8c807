/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A multi-valued, order-preserving query parameter map.

use crate::percent_encode::PercentEncoding;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    key: String,
    value: Option<String>,
}

/// A multi-valued map of query parameters that preserves the relative order of
/// first-occurrence keys, and the relative order of values within a key.
///
/// Unlike [`crate::headers::Headers`], lookup is exact-match (query parameter names are
/// case-sensitive per RFC 3986).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    entries: Vec<Entry>,
}

impl QueryParameters {
    /// Creates an empty query parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key/value pair, keeping any prior values for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Entry {
            key: key.into(),
            value: Some(value.into()),
        });
    }

    /// Appends a valueless key (e.g. `?flag` with no `=`).
    pub fn append_flag(&mut self, key: impl Into<String>) {
        self.entries.push(Entry {
            key: key.into(),
            value: None,
        });
    }

    /// Removes all existing values for `key` and sets a single value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.entries.retain(|e| e.key != key);
        self.entries.push(Entry {
            key,
            value: Some(value.into()),
        });
    }

    /// Returns the first value for `key`, if present. A valueless flag yields `Some("")`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_deref().unwrap_or(""))
    }

    /// Returns all values for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.key == key)
            .map(|e| e.value.as_deref().unwrap_or(""))
    }

    /// Returns `true` if `key` has at least one value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Returns the total number of key/value pairs (not distinct keys).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no parameters at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(key, value)` pairs in insertion order; a valueless flag yields `""`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_deref().unwrap_or("")))
    }

    /// Parses a `key1=value1&key2=value2` query string (already extracted from a URL,
    /// i.e. without a leading `?`) into a `QueryParameters`, percent-decoding each
    /// component under the given scheme.
    pub fn parse(raw: &str, scheme: PercentEncoding) -> Self {
        let mut params = QueryParameters::new();
        if raw.is_empty() {
            return params;
        }
        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }
            match pair.split_once('=') {
                Some((k, v)) => {
                    params.append(scheme.decode(k), scheme.decode(v));
                }
                None => params.append_flag(scheme.decode(pair)),
            }
        }
        params
    }

    /// Renders this map back into a `key1=value1&key2=value2` query string, re-encoding
    /// each component under the given scheme. Order is preserved as stored (callers that
    /// need SigV4's sorted canonical query should use
    /// [`crate::percent_encode::canonical_query_string`] instead).
    pub fn to_query_string(&self, scheme: PercentEncoding) -> String {
        let mut out = String::new();
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(&scheme.encode(k));
            if self.entries[i].value.is_some() {
                out.push('=');
                out.push_str(&scheme.encode(v));
            }
        }
        out
    }
}

impl fmt::Debug for QueryParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_preserves_first_occurrence_order() {
        let params = QueryParameters::parse("b=2&a=1&b=3", PercentEncoding::FormUrl);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "b"]);
    }

    #[test]
    fn round_trip_preserves_order() {
        let raw = "foo=1&bar=2&foo=3";
        let params = QueryParameters::parse(raw, PercentEncoding::FormUrl);
        assert_eq!(params.to_query_string(PercentEncoding::FormUrl), raw);
    }

    #[test]
    fn valueless_flag_round_trips() {
        let params = QueryParameters::parse("flag&x=1", PercentEncoding::FormUrl);
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.to_query_string(PercentEncoding::FormUrl), "flag&x=1");
    }
}
