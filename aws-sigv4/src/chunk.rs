/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Signing for chunked-transfer payloads (`aws-chunked` / `STREAMING-*-PAYLOAD-TRAILER`).
//!
//! Each chunk's string-to-sign is chained off the previous chunk's (or, for the first
//! chunk, the initial request's) signature, so a chunk cannot be reordered or dropped
//! without invalidating every signature after it. The final, zero-length chunk is signed
//! the same way, and an optional trailer (e.g. an `x-amz-checksum-*` digest of the whole
//! body) is itself signed as one more "chunk" once every data chunk has been sent.

use crate::sign::v4::sha256_hex_string;
use smithy_types::date_time;
use std::time::SystemTime;

/// The SHA-256 hash of an empty string, used as the "payload hash" placeholder for a
/// chunk's string-to-sign (chunks are authenticated by the chain of signatures, not by a
/// hash of their own content appearing in the credential scope line).
const EMPTY_STRING_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// One chunk of a chunked-transfer body awaiting a signature.
#[derive(Debug, Clone, Copy)]
pub struct SignableChunk<'a> {
    /// The chunk's raw bytes. Empty for the final chunk.
    pub data: &'a [u8],
}

/// A trailer (e.g. a trailing checksum header block) awaiting a signature, signed as the
/// final element of a chunked body after the zero-length terminating chunk.
#[derive(Debug, Clone, Copy)]
pub struct SignableTrailer<'a> {
    /// The trailer's canonicalized text, e.g. `x-amz-checksum-crc32:AAAAAA==\n`.
    pub canonical_text: &'a str,
}

/// Builds the string-to-sign for one chunk and signs it with `compute_signature`, chaining
/// off `previous_signature` (the signature of the previous chunk, or of the initial signed
/// request for the first chunk).
///
/// Returns the lowercase-hex chunk signature, which both becomes this chunk's
/// `previous_signature` for the next call and is written onto the wire as the chunk's
/// `chunk-signature=` extension.
pub fn sign_chunk(
    chunk: SignableChunk<'_>,
    previous_signature: &str,
    date_time: SystemTime,
    credential_scope: &str,
    algorithm: &'static str,
    compute_signature: impl FnOnce(&[u8]) -> String,
) -> String {
    let string_to_sign = chunk_string_to_sign(
        sha256_hex_string(chunk.data),
        previous_signature,
        date_time,
        credential_scope,
        algorithm,
    );
    compute_signature(string_to_sign.as_bytes())
}

/// Builds the string-to-sign for the trailer that follows the final chunk and signs it.
pub fn sign_trailer(
    trailer: SignableTrailer<'_>,
    previous_signature: &str,
    date_time: SystemTime,
    credential_scope: &str,
    algorithm: &'static str,
    compute_signature: impl FnOnce(&[u8]) -> String,
) -> String {
    let string_to_sign = chunk_string_to_sign(
        sha256_hex_string(trailer.canonical_text.as_bytes()),
        previous_signature,
        date_time,
        credential_scope,
        algorithm,
    );
    compute_signature(string_to_sign.as_bytes())
}

fn chunk_string_to_sign(
    chunk_hash: String,
    previous_signature: &str,
    date_time: SystemTime,
    credential_scope: &str,
    algorithm: &'static str,
) -> String {
    let date_time = date_time::format_date_time(date_time.into());
    format!(
        "{algorithm}-PAYLOAD\n{date_time}\n{credential_scope}\n{previous_signature}\n{EMPTY_STRING_SHA256}\n{chunk_hash}"
    )
}

/// Formats one chunk's wire framing: `<hex length>;chunk-signature=<sig>\r\n<data>\r\n`.
pub fn frame_chunk(data: &[u8], signature: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + signature.len() + 32);
    out.extend_from_slice(format!("{:x};chunk-signature={signature}\r\n", data.len()).as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::v4::{calculate_signature, generate_signing_key};

    fn signing_time() -> SystemTime {
        date_time::parse_date_time("20130524T000000Z").unwrap().into()
    }

    #[test]
    fn chunk_signature_chains_off_the_previous_signature() {
        let signing_key = generate_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            signing_time(),
            "us-east-1",
            "s3",
        );
        let credential_scope = "20130524/us-east-1/s3/aws4_request";
        let seed_signature = "seed-signature-from-initial-request";

        let first = sign_chunk(
            SignableChunk { data: b"hello " },
            seed_signature,
            signing_time(),
            credential_scope,
            "AWS4-HMAC-SHA256",
            |sts| calculate_signature(signing_key, sts),
        );
        let second = sign_chunk(
            SignableChunk { data: b"world" },
            &first,
            signing_time(),
            credential_scope,
            "AWS4-HMAC-SHA256",
            |sts| calculate_signature(signing_key, sts),
        );

        assert_ne!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn final_zero_length_chunk_signs_deterministically() {
        let signing_key = generate_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            signing_time(),
            "us-east-1",
            "s3",
        );
        let credential_scope = "20130524/us-east-1/s3/aws4_request";
        let sig = sign_chunk(
            SignableChunk { data: b"" },
            "prev",
            signing_time(),
            credential_scope,
            "AWS4-HMAC-SHA256",
            |sts| calculate_signature(signing_key, sts),
        );
        assert!(!sig.is_empty());
    }

    #[test]
    fn frame_chunk_writes_hex_length_and_signature_extension() {
        let framed = frame_chunk(b"abc", "deadbeef");
        assert_eq!(framed, b"3;chunk-signature=deadbeef\r\nabc\r\n".to_vec());
    }
}
