/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The token sum type emitted by [`crate::reader::JsonTokenReader`].

/// One lexical unit of a JSON document.
///
/// `Number` and the raw form of every scalar preserve their original textual
/// representation rather than eagerly parsing to `f64`, so a consumer can reinterpret a
/// number losslessly (e.g. as an integer, a `Decimal`, or a float) without the reader
/// making that choice on its behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonToken {
    /// `{`
    StartObject,
    /// `}`
    EndObject,
    /// `[`
    StartArray,
    /// `]`
    EndArray,
    /// An object key.
    Name(String),
    /// A string value, already un-escaped.
    ValueString(String),
    /// A number value, in its original textual form.
    ValueNumber(String),
    /// `true` or `false`.
    ValueBool(bool),
    /// `null`.
    ValueNull,
    /// Emitted once after the root value has been fully consumed.
    EndDocument,
}

/// The *kind* of the next token, without its payload — what [`crate::reader::JsonTokenReader::peek`]
/// returns so callers can branch without committing to consuming the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawJsonToken {
    /// See [`JsonToken::StartObject`].
    StartObject,
    /// See [`JsonToken::EndObject`].
    EndObject,
    /// See [`JsonToken::StartArray`].
    StartArray,
    /// See [`JsonToken::EndArray`].
    EndArray,
    /// See [`JsonToken::Name`].
    Name,
    /// See [`JsonToken::ValueString`].
    ValueString,
    /// See [`JsonToken::ValueNumber`].
    ValueNumber,
    /// See [`JsonToken::ValueBool`].
    ValueBool,
    /// See [`JsonToken::ValueNull`].
    ValueNull,
    /// See [`JsonToken::EndDocument`].
    EndDocument,
}

impl From<&JsonToken> for RawJsonToken {
    fn from(token: &JsonToken) -> Self {
        match token {
            JsonToken::StartObject => RawJsonToken::StartObject,
            JsonToken::EndObject => RawJsonToken::EndObject,
            JsonToken::StartArray => RawJsonToken::StartArray,
            JsonToken::EndArray => RawJsonToken::EndArray,
            JsonToken::Name(_) => RawJsonToken::Name,
            JsonToken::ValueString(_) => RawJsonToken::ValueString,
            JsonToken::ValueNumber(_) => RawJsonToken::ValueNumber,
            JsonToken::ValueBool(_) => RawJsonToken::ValueBool,
            JsonToken::ValueNull => RawJsonToken::ValueNull,
            JsonToken::EndDocument => RawJsonToken::EndDocument,
        }
    }
}
