/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A pull-based JSON tokenizer: [`JsonTokenReader`] emits one [`JsonToken`] per call to
//! [`JsonTokenReader::next_token`], tracking a stack of enclosing containers so that
//! mismatched or premature closes are reported as errors rather than panics.

use crate::error::{DeserializeError, DeserializeErrorKind};
use crate::escape::unescape_string;
use crate::token::{JsonToken, RawJsonToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    ExpectKeyOrEnd,
    ExpectColon,
    ExpectValue,
    ExpectCommaOrEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    ExpectValueOrEnd,
    ExpectCommaOrEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object(ObjectState),
    Array(ArrayState),
}

/// A streaming JSON tokenizer over an in-memory document.
#[derive(Debug, Clone)]
pub struct JsonTokenReader<'a> {
    data: &'a str,
    pos: usize,
    stack: Vec<Frame>,
    root_consumed: bool,
}

impl<'a> JsonTokenReader<'a> {
    /// Starts tokenizing `data` from the beginning.
    pub fn new(data: &'a str) -> Self {
        Self {
            data,
            pos: 0,
            stack: Vec::new(),
            root_consumed: false,
        }
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Result<JsonToken, DeserializeError> {
        loop {
            self.skip_whitespace();
            match self.stack.last().copied() {
                None => {
                    if self.root_consumed {
                        return if self.at_eof() {
                            Ok(JsonToken::EndDocument)
                        } else {
                            self.err(DeserializeErrorKind::UnexpectedToken(
                                self.peek_char().unwrap_or('\0'),
                                "end of document",
                            ))
                        };
                    }
                    if self.at_eof() {
                        return self.err(DeserializeErrorKind::UnexpectedEos);
                    }
                    return self.parse_value_start();
                }
                Some(Frame::Object(ObjectState::ExpectKeyOrEnd)) => {
                    match self.peek_char() {
                        Some('}') => {
                            self.pos += 1;
                            self.close_frame();
                            return Ok(JsonToken::EndObject);
                        }
                        Some('"') => {
                            let name = self.parse_string_literal()?;
                            *self.stack.last_mut().unwrap() = Frame::Object(ObjectState::ExpectColon);
                            return Ok(JsonToken::Name(name));
                        }
                        other => {
                            return self
                                .err(DeserializeErrorKind::UnexpectedToken(other.unwrap_or('\0'), "'\"' or '}'"))
                        }
                    }
                }
                Some(Frame::Object(ObjectState::ExpectColon)) => match self.peek_char() {
                    Some(':') => {
                        self.pos += 1;
                        *self.stack.last_mut().unwrap() = Frame::Object(ObjectState::ExpectValue);
                        continue;
                    }
                    other => return self.err(DeserializeErrorKind::UnexpectedToken(other.unwrap_or('\0'), "':'")),
                },
                Some(Frame::Object(ObjectState::ExpectValue)) => {
                    *self.stack.last_mut().unwrap() = Frame::Object(ObjectState::ExpectCommaOrEnd);
                    return self.parse_value_start();
                }
                Some(Frame::Object(ObjectState::ExpectCommaOrEnd)) => match self.peek_char() {
                    Some(',') => {
                        self.pos += 1;
                        *self.stack.last_mut().unwrap() = Frame::Object(ObjectState::ExpectKeyOrEnd);
                        continue;
                    }
                    Some('}') => {
                        self.pos += 1;
                        self.close_frame();
                        return Ok(JsonToken::EndObject);
                    }
                    other => {
                        return self
                            .err(DeserializeErrorKind::UnexpectedToken(other.unwrap_or('\0'), "',' or '}'"))
                    }
                },
                Some(Frame::Array(ArrayState::ExpectValueOrEnd)) => {
                    if self.peek_char() == Some(']') {
                        self.pos += 1;
                        self.close_frame();
                        return Ok(JsonToken::EndArray);
                    }
                    *self.stack.last_mut().unwrap() = Frame::Array(ArrayState::ExpectCommaOrEnd);
                    return self.parse_value_start();
                }
                Some(Frame::Array(ArrayState::ExpectCommaOrEnd)) => match self.peek_char() {
                    Some(',') => {
                        self.pos += 1;
                        *self.stack.last_mut().unwrap() = Frame::Array(ArrayState::ExpectValueOrEnd);
                        continue;
                    }
                    Some(']') => {
                        self.pos += 1;
                        self.close_frame();
                        return Ok(JsonToken::EndArray);
                    }
                    other => {
                        return self
                            .err(DeserializeErrorKind::UnexpectedToken(other.unwrap_or('\0'), "',' or ']'"))
                    }
                },
            }
        }
    }

    /// Returns the *kind* of the next token without consuming it.
    pub fn peek(&mut self) -> Result<RawJsonToken, DeserializeError> {
        let saved_pos = self.pos;
        let saved_stack = self.stack.clone();
        let saved_root_consumed = self.root_consumed;
        let result = self.next_token();
        self.pos = saved_pos;
        self.stack = saved_stack;
        self.root_consumed = saved_root_consumed;
        result.map(|token| RawJsonToken::from(&token))
    }

    /// Consumes and discards the next value, recursing into objects/arrays so that a
    /// single call skips an entire composite value regardless of depth.
    pub fn skip_next(&mut self) -> Result<(), DeserializeError> {
        match self.next_token()? {
            JsonToken::StartObject | JsonToken::StartArray => {
                let mut depth = 1usize;
                while depth > 0 {
                    match self.next_token()? {
                        JsonToken::StartObject | JsonToken::StartArray => depth += 1,
                        JsonToken::EndObject | JsonToken::EndArray => depth -= 1,
                        _ => {}
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn parse_value_start(&mut self) -> Result<JsonToken, DeserializeError> {
        match self.peek_char() {
            Some('{') => {
                self.pos += 1;
                self.stack.push(Frame::Object(ObjectState::ExpectKeyOrEnd));
                Ok(JsonToken::StartObject)
            }
            Some('[') => {
                self.pos += 1;
                self.stack.push(Frame::Array(ArrayState::ExpectValueOrEnd));
                Ok(JsonToken::StartArray)
            }
            Some('"') => {
                let s = self.parse_string_literal()?;
                self.after_scalar_value();
                Ok(JsonToken::ValueString(s))
            }
            Some('t') => {
                self.expect_literal("true")?;
                self.after_scalar_value();
                Ok(JsonToken::ValueBool(true))
            }
            Some('f') => {
                self.expect_literal("false")?;
                self.after_scalar_value();
                Ok(JsonToken::ValueBool(false))
            }
            Some('n') => {
                self.expect_literal("null")?;
                self.after_scalar_value();
                Ok(JsonToken::ValueNull)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let raw = self.parse_number_literal()?;
                self.after_scalar_value();
                Ok(JsonToken::ValueNumber(raw))
            }
            other => self.err(DeserializeErrorKind::UnexpectedToken(other.unwrap_or('\0'), "a JSON value")),
        }
    }

    fn close_frame(&mut self) {
        self.stack.pop();
        self.after_scalar_value();
    }

    fn after_scalar_value(&mut self) {
        match self.stack.last_mut() {
            Some(Frame::Object(state)) => *state = ObjectState::ExpectCommaOrEnd,
            Some(Frame::Array(state)) => *state = ArrayState::ExpectCommaOrEnd,
            None => self.root_consumed = true,
        }
    }

    fn expect_literal(&mut self, literal: &'static str) -> Result<(), DeserializeError> {
        if self.data[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            self.err(DeserializeErrorKind::ExpectedLiteral(literal.to_string()))
        }
    }

    fn parse_string_literal(&mut self) -> Result<String, DeserializeError> {
        debug_assert_eq!(self.peek_char(), Some('"'));
        let bytes = self.data.as_bytes();
        let start = self.pos + 1;
        let mut i = start;
        loop {
            if i >= bytes.len() {
                return self.err(DeserializeErrorKind::UnexpectedEos);
            }
            match bytes[i] {
                b'"' => break,
                b'\\' => {
                    i += 2;
                }
                b if b < 0x20 => {
                    return self.err(DeserializeErrorKind::UnexpectedControlCharacter(b));
                }
                _ => i += 1,
            }
        }
        let raw = &self.data[start..i];
        self.pos = i + 1;
        let unescaped = unescape_string(raw)?;
        Ok(unescaped.into_owned())
    }

    fn parse_number_literal(&mut self) -> Result<String, DeserializeError> {
        let start = self.pos;
        let bytes = self.data.as_bytes();
        let mut i = start;
        if i < bytes.len() && bytes[i] == b'-' {
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digits_start {
            return self.err(DeserializeErrorKind::InvalidNumber);
        }
        if i < bytes.len() && bytes[i] == b'.' {
            i += 1;
            let frac_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i == frac_start {
                return self.err(DeserializeErrorKind::InvalidNumber);
            }
        }
        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            i += 1;
            if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
                i += 1;
            }
            let exp_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i == exp_start {
                return self.err(DeserializeErrorKind::InvalidNumber);
            }
        }
        self.pos = i;
        Ok(self.data[start..i].to_string())
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.data.as_bytes();
        while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t' | b'\n' | b'\r') {
            self.pos += 1;
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.data[self.pos..].chars().next()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn err<T>(&self, kind: DeserializeErrorKind) -> Result<T, DeserializeError> {
        Err(DeserializeError::new(kind, Some(self.pos)))
    }
}
