/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Streaming checksums over the bytes that pass through a reader, computed incrementally
//! as each chunk is observed rather than requiring a second pass over the full body.

use md5::Md5;
use sha1::Sha1;
use sha2::digest::Digest;
use sha2::Sha256;
use std::fmt;

/// The checksum algorithm a [`HashingReader`] accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// CRC-32 (IEEE 802.3 polynomial), as used by `x-amz-checksum-crc32`.
    Crc32,
    /// CRC-32C (Castagnoli polynomial), as used by `x-amz-checksum-crc32c`.
    Crc32c,
    /// MD5, as used by the legacy `Content-MD5` header.
    Md5,
    /// SHA-1, as used by `x-amz-checksum-sha1`.
    Sha1,
    /// SHA-256, as used by `x-amz-checksum-sha256` and payload-hash signing.
    Sha256,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Crc32 => "crc32",
            HashAlgorithm::Crc32c => "crc32c",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        };
        f.write_str(name)
    }
}

enum Inner {
    Crc32(crc_fast::Digest),
    Crc32c(crc_fast::Digest),
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

/// Accumulates a checksum over every byte passed to [`HashingReader::update`], exposing
/// the running digest on demand without finalizing (so it can keep accepting bytes).
pub struct HashingReader {
    algorithm: HashAlgorithm,
    inner: Inner,
}

impl HashingReader {
    /// Starts a new, empty running checksum of the given algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let inner = match algorithm {
            HashAlgorithm::Crc32 => Inner::Crc32(crc_fast::Digest::new(crc_fast::CrcAlgorithm::Crc32IsoHdlc)),
            HashAlgorithm::Crc32c => Inner::Crc32c(crc_fast::Digest::new(crc_fast::CrcAlgorithm::Crc32Iscsi)),
            HashAlgorithm::Md5 => Inner::Md5(Md5::new()),
            HashAlgorithm::Sha1 => Inner::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Inner::Sha256(Sha256::new()),
        };
        Self { algorithm, inner }
    }

    /// The algorithm this reader was constructed with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Folds `chunk` into the running checksum.
    pub fn update(&mut self, chunk: &[u8]) {
        match &mut self.inner {
            Inner::Crc32(d) => d.update(chunk),
            Inner::Crc32c(d) => d.update(chunk),
            Inner::Md5(d) => d.update(chunk),
            Inner::Sha1(d) => d.update(chunk),
            Inner::Sha256(d) => d.update(chunk),
        }
    }

    /// Finalizes the checksum and returns its raw bytes. Consumes the reader since CRC
    /// digests in `crc-fast` finalize by value.
    pub fn digest(self) -> Vec<u8> {
        match self.inner {
            Inner::Crc32(d) => (d.finalize() as u32).to_be_bytes().to_vec(),
            Inner::Crc32c(d) => (d.finalize() as u32).to_be_bytes().to_vec(),
            Inner::Md5(d) => d.finalize().to_vec(),
            Inner::Sha1(d) => d.finalize().to_vec(),
            Inner::Sha256(d) => d.finalize().to_vec(),
        }
    }

    /// Finalizes the checksum and base64-encodes it, the form used in `x-amz-checksum-*`
    /// response and trailer headers.
    pub fn digest_base64(self) -> String {
        base64_encode(&self.digest())
    }

    /// Finalizes the checksum and lower-hex-encodes it, the form used for SigV4 payload
    /// hashes (`x-amz-content-sha256`).
    pub fn digest_hex(self) -> String {
        hex::encode(self.digest())
    }
}

/// SHA-256 of a single in-memory payload, used for the `x-amz-content-sha256` header
/// when the body is already fully buffered.
pub fn sha256_hex(payload: &[u8]) -> String {
    let mut hasher = HashingReader::new(HashAlgorithm::Sha256);
    hasher.update(payload);
    hasher.digest_hex()
}

const BASE64_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();
        out.push(BASE64_ALPHABET[(b0 >> 2) as usize] as char);
        out.push(BASE64_ALPHABET[(((b0 & 0x03) << 4) | (b1.unwrap_or(0) >> 4)) as usize] as char);
        match b1 {
            Some(b1) => {
                out.push(BASE64_ALPHABET[(((b1 & 0x0f) << 2) | (b2.unwrap_or(0) >> 6)) as usize] as char);
            }
            None => out.push('='),
        }
        match b2 {
            Some(b2) => out.push(BASE64_ALPHABET[(b2 & 0x3f) as usize] as char),
            None => out.push('='),
        }
    }
    out
}
