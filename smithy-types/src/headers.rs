/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A multi-valued, case-insensitive header map that preserves the casing a value was
//! inserted with (for emission) while case-folding on lookup, equality, and sorting.

use std::fmt;

/// A single stored header: original casing of the name, plus its value.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    name: String,
    value: String,
}

/// A case-insensitive, multi-valued, insertion-order-preserving header map.
///
/// Lookup and equality case-fold the header name; the original casing supplied on
/// [`Headers::append`]/[`Headers::insert`] is retained for emission, matching the
/// convention that most HTTP servers are case-insensitive but some picky ones are not.
#[derive(Clone, Default)]
pub struct Headers {
    entries: Vec<Entry>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first value associated with `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.value.as_str())
    }

    /// Returns all values associated with `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.value.as_str())
    }

    /// Returns `true` if at least one value is associated with `name`.
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Appends a value, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Entry {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Removes all existing values for `name` and replaces them with a single value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.retain(|e| !e.name.eq_ignore_ascii_case(&name));
        self.entries.push(Entry {
            name,
            value: value.into(),
        });
    }

    /// Removes all values for `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.name.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    /// Returns the total number of name/value pairs stored (not distinct names).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates all name/value pairs in insertion order. A header with N values appears
    /// as N separate pairs sharing the same (case-folded-equal) name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.name.as_str(), e.value.as_str()))
    }

    /// Iterates distinct header names in first-occurrence order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let mut seen: Vec<&str> = Vec::new();
        self.entries.iter().filter_map(move |e| {
            if seen.iter().any(|s| s.eq_ignore_ascii_case(&e.name)) {
                None
            } else {
                seen.push(&e.name);
                Some(e.name.as_str())
            }
        })
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            // Avoid leaking credential-bearing header values (e.g. security tokens,
            // authorization) into logs by default.
            if k.eq_ignore_ascii_case("authorization") || k.eq_ignore_ascii_case("x-amz-security-token")
            {
                map.entry(&k, &"** redacted **");
            } else {
                map.entry(&k, &v);
            }
        }
        map.finish()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}
