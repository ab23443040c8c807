/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A growable byte buffer used to stage bytes before they cross a channel boundary.
//!
//! Growth follows a `(capacity * 3 + 1) / 2` policy so repeated small appends amortize
//! to O(1) without the buffer doubling as aggressively as `Vec`'s default strategy.

use bytes::{Buf, BufMut, BytesMut};

/// A growable buffer with explicit discard/rewind controls, used as the staging area
/// for non-auto-flush writers and as the destination for `read_fully`-style consumers.
#[derive(Debug, Default)]
pub struct SdkBuffer {
    inner: BytesMut,
    read_pos: usize,
}

impl SdkBuffer {
    /// An empty buffer with no pre-allocated capacity.
    pub fn new() -> Self {
        Self {
            inner: BytesMut::new(),
            read_pos: 0,
        }
    }

    /// An empty buffer pre-allocated to hold at least `capacity` bytes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        self.inner.len() - self.read_pos
    }

    /// `true` when there are no unread bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `data`, growing the backing store by the `(cap*3+1)/2` policy if needed.
    pub fn write(&mut self, data: &[u8]) {
        self.reserve(data.len());
        self.inner.put_slice(data);
    }

    fn reserve(&mut self, additional: usize) {
        let needed = self.inner.len() + additional;
        if needed <= self.inner.capacity() {
            return;
        }
        let mut new_capacity = self.inner.capacity().max(16);
        while new_capacity < needed {
            new_capacity = (new_capacity * 3 + 1) / 2;
        }
        self.inner.reserve(new_capacity - self.inner.len());
    }

    /// Returns up to `limit` unread bytes without consuming them.
    pub fn peek(&self, limit: usize) -> &[u8] {
        let available = &self.inner[self.read_pos..];
        &available[..limit.min(available.len())]
    }

    /// Consumes and returns up to `limit` unread bytes, advancing the read cursor.
    pub fn read(&mut self, limit: usize) -> Vec<u8> {
        let take = limit.min(self.len());
        let out = self.inner[self.read_pos..self.read_pos + take].to_vec();
        self.read_pos += take;
        self.compact_if_worthwhile();
        out
    }

    /// Discards `n` unread bytes without copying them anywhere.
    pub fn discard(&mut self, n: usize) {
        self.read_pos = (self.read_pos + n).min(self.inner.len());
        self.compact_if_worthwhile();
    }

    /// Moves the read cursor back by `n` bytes, re-exposing previously read bytes.
    /// Clamped to the start of the buffer.
    pub fn rewind(&mut self, n: usize) {
        self.read_pos = self.read_pos.saturating_sub(n);
    }

    /// Discards all unread bytes and resets the buffer to empty.
    pub fn reset(&mut self) {
        self.inner.clear();
        self.read_pos = 0;
    }

    /// Drains every unread byte from `self` into the end of `other`.
    pub fn transfer_to(&mut self, other: &mut SdkBuffer) {
        other.write(&self.inner[self.read_pos..]);
        self.reset();
    }

    /// Interprets the unread bytes as UTF-8, without consuming them.
    pub fn peek_utf8(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.inner[self.read_pos..])
    }

    fn compact_if_worthwhile(&mut self) {
        if self.read_pos > 0 && self.read_pos == self.inner.len() {
            self.inner.clear();
            self.read_pos = 0;
        } else if self.read_pos > 4096 && self.read_pos * 2 > self.inner.capacity() {
            self.inner.advance(self.read_pos);
            self.read_pos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let mut buf = SdkBuffer::new();
        buf.write(b"hello");
        buf.write(b" world");
        assert_eq!(buf.len(), 11);
        assert_eq!(buf.read(5), b"hello");
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.read(100), b" world");
        assert!(buf.is_empty());
    }

    #[test]
    fn discard_advances_without_copying() {
        let mut buf = SdkBuffer::new();
        buf.write(b"0123456789");
        buf.discard(4);
        assert_eq!(buf.peek(100), b"456789");
    }

    #[test]
    fn rewind_reexposes_discarded_bytes() {
        let mut buf = SdkBuffer::new();
        buf.write(b"abcdef");
        buf.read(3);
        buf.rewind(1);
        assert_eq!(buf.peek(100), b"cdef");
    }

    #[test]
    fn transfer_to_moves_all_unread_bytes() {
        let mut a = SdkBuffer::new();
        a.write(b"xyz");
        let mut b = SdkBuffer::new();
        b.write(b"ab");
        a.transfer_to(&mut b);
        assert!(a.is_empty());
        assert_eq!(b.read(100), b"abxyz");
    }

    #[test]
    fn peek_utf8_does_not_consume() {
        let mut buf = SdkBuffer::new();
        buf.write("hello".as_bytes());
        assert_eq!(buf.peek_utf8().unwrap(), "hello");
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut buf = SdkBuffer::with_capacity(4);
        let chunk = vec![7u8; 1000];
        buf.write(&chunk);
        assert_eq!(buf.len(), 1000);
    }
}
