/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A stateful JSON emitter: `begin_object`/`end_object`, `begin_array`/`end_array`,
//! `write_name`, and `write_value` for every primitive kind, with automatic comma and
//! (in pretty mode) indentation insertion.

use crate::escape::escape_string;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object { wrote_entry: bool },
    Array { wrote_entry: bool },
}

/// A JSON document writer, in either compact or pretty-printed mode.
#[derive(Debug)]
pub struct JsonValueWriter {
    buffer: String,
    stack: Vec<Frame>,
    pretty: bool,
}

impl JsonValueWriter {
    /// Starts a new, empty compact writer.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            stack: Vec::new(),
            pretty: false,
        }
    }

    /// Starts a new, empty writer that indents with two spaces per nesting level.
    pub fn pretty() -> Self {
        Self {
            buffer: String::new(),
            stack: Vec::new(),
            pretty: true,
        }
    }

    /// Opens a new object.
    pub fn begin_object(&mut self) {
        self.before_value();
        self.buffer.push('{');
        self.stack.push(Frame::Object { wrote_entry: false });
    }

    /// Closes the innermost object.
    pub fn end_object(&mut self) {
        let wrote_entry = matches!(self.stack.pop(), Some(Frame::Object { wrote_entry: true }));
        if wrote_entry && self.pretty {
            self.newline_indent();
        }
        self.buffer.push('}');
        self.mark_written();
    }

    /// Opens a new array.
    pub fn begin_array(&mut self) {
        self.before_value();
        self.buffer.push('[');
        self.stack.push(Frame::Array { wrote_entry: false });
    }

    /// Closes the innermost array.
    pub fn end_array(&mut self) {
        let wrote_entry = matches!(self.stack.pop(), Some(Frame::Array { wrote_entry: true }));
        if wrote_entry && self.pretty {
            self.newline_indent();
        }
        self.buffer.push(']');
        self.mark_written();
    }

    /// Writes an object key.
    pub fn write_name(&mut self, name: &str) {
        self.before_entry();
        self.write_escaped_string(name);
        self.buffer.push(':');
        if self.pretty {
            self.buffer.push(' ');
        }
    }

    /// Writes a string value.
    pub fn write_string(&mut self, value: &str) {
        self.before_value();
        self.write_escaped_string(value);
        self.mark_written();
    }

    /// Writes a boolean value.
    pub fn write_bool(&mut self, value: bool) {
        self.before_value();
        self.buffer.push_str(if value { "true" } else { "false" });
        self.mark_written();
    }

    /// Writes a signed integer value.
    pub fn write_i64(&mut self, value: i64) {
        self.before_value();
        let mut itoa_buf = itoa::Buffer::new();
        self.buffer.push_str(itoa_buf.format(value));
        self.mark_written();
    }

    /// Writes an unsigned integer value.
    pub fn write_u64(&mut self, value: u64) {
        self.before_value();
        let mut itoa_buf = itoa::Buffer::new();
        self.buffer.push_str(itoa_buf.format(value));
        self.mark_written();
    }

    /// Writes a floating point value. Non-finite values serialize as the quoted
    /// strings `"NaN"`, `"Infinity"`, `"-Infinity"`, matching the wire format AWS JSON
    /// protocols use since plain JSON has no literal for them.
    pub fn write_f64(&mut self, value: f64) {
        self.before_value();
        if value.is_nan() {
            self.buffer.push_str("\"NaN\"");
        } else if value.is_infinite() {
            self.buffer.push_str(if value > 0.0 { "\"Infinity\"" } else { "\"-Infinity\"" });
        } else {
            let mut ryu_buf = ryu::Buffer::new();
            self.buffer.push_str(ryu_buf.format(value));
        }
        self.mark_written();
    }

    /// Writes a `null` value.
    pub fn write_null(&mut self) {
        self.before_value();
        self.buffer.push_str("null");
        self.mark_written();
    }

    /// Writes a pre-serialized JSON fragment verbatim, for values a caller has already
    /// rendered (e.g. a nested document passed through unmodified).
    pub fn write_raw_value(&mut self, raw_json: &str) {
        self.before_value();
        self.buffer.push_str(raw_json);
        self.mark_written();
    }

    /// Finalizes the document. Idempotent: calling it more than once returns the same
    /// bytes since writing never mutates already-written output.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_bytes()
    }

    /// Borrows the document written so far without consuming the writer.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    fn write_escaped_string(&mut self, value: &str) {
        self.buffer.push('"');
        let _ = write!(self.buffer, "{}", escape_string(value));
        self.buffer.push('"');
    }

    fn before_entry(&mut self) {
        if let Some(Frame::Object { wrote_entry }) = self.stack.last_mut() {
            if *wrote_entry {
                self.buffer.push(',');
            }
        }
        if self.pretty {
            self.newline_indent();
        }
    }

    fn before_value(&mut self) {
        if let Some(Frame::Array { wrote_entry }) = self.stack.last_mut() {
            let first = !*wrote_entry;
            if !first {
                self.buffer.push(',');
            }
            if self.pretty {
                self.newline_indent();
            }
        }
    }

    fn mark_written(&mut self) {
        match self.stack.last_mut() {
            Some(Frame::Object { wrote_entry }) => *wrote_entry = true,
            Some(Frame::Array { wrote_entry }) => *wrote_entry = true,
            None => {}
        }
    }

    fn newline_indent(&mut self) {
        self.buffer.push('\n');
        for _ in 0..self.stack.len() {
            self.buffer.push_str("  ");
        }
    }
}

impl Default for JsonValueWriter {
    fn default() -> Self {
        Self::new()
    }
}
