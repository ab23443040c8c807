/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Gzip compression overlay for request bodies, compressing chunks as they are written
//! rather than requiring the whole body to be buffered first.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// Wraps a [`crate::channel::Writer`]-style sink with on-the-fly gzip compression.
///
/// Every call to [`GzipCompressor::write`] feeds the encoder, which may or may not
/// produce compressed output immediately (gzip buffers internally); call [`finish`] once
/// all input has been written to flush the trailer and recover the compressed bytes.
///
/// [`finish`]: GzipCompressor::finish
pub struct GzipCompressor {
    encoder: GzEncoder<Vec<u8>>,
}

impl GzipCompressor {
    /// Starts a new compressor at the default compression level, matching the level
    /// used for the `aws-chunked` / `Content-Encoding: gzip` request body overlay.
    pub fn new() -> Self {
        Self {
            encoder: GzEncoder::new(Vec::new(), Compression::default()),
        }
    }

    /// Feeds `chunk` into the encoder.
    pub fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.encoder.write_all(chunk)
    }

    /// Finalizes the gzip stream (header already emitted lazily, trailer written here)
    /// and returns every compressed byte produced so far.
    pub fn finish(self) -> io::Result<Vec<u8>> {
        self.encoder.finish()
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decompresses a complete gzip-encoded payload in one shot. Used on the receive side,
/// where AWS services return bodies compressed with `Content-Encoding: gzip`.
pub fn decompress_all(input: &[u8]) -> io::Result<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(input);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_payload() {
        let mut gz = GzipCompressor::new();
        gz.write(b"the quick brown fox jumps over the lazy dog").unwrap();
        let compressed = gz.finish().unwrap();
        let decompressed = decompress_all(&compressed).unwrap();
        assert_eq!(decompressed, b"the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn compresses_across_multiple_writes() {
        let mut gz = GzipCompressor::new();
        for _ in 0..100 {
            gz.write(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        }
        let compressed = gz.finish().unwrap();
        assert!(compressed.len() < 4000);
        let decompressed = decompress_all(&compressed).unwrap();
        assert_eq!(decompressed.len(), 4000);
    }
}
