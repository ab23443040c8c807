/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Signing for individual messages of a `vnd.amazon.event-stream` body.
//!
//! Event-stream signing reuses the chunk-signing chain (each message's signature depends
//! on the previous message's), but the hash that stands in for the payload in the
//! string-to-sign is not of the message bytes directly. Instead it is a "non-signature
//! headers" hash: the event-stream wire encoding of a single `:date` header carrying the
//! signing timestamp, hashed the same way the message payload would be. This lets a
//! consumer verify each message's signature without buffering the whole stream, while
//! still binding every message to the moment it was signed.

use crate::sign::v4::sha256_hex_string;
use smithy_types::date_time;
use std::time::SystemTime;

/// Encodes a single `:date` header in event-stream wire format: a one-byte name length, the
/// name, a one-byte header-value-type discriminant (`8` for a timestamp, milliseconds since
/// the epoch, big-endian i64), and the 8-byte value.
fn encode_date_header(date_time: SystemTime) -> Vec<u8> {
    const NAME: &[u8] = b":date";
    const TIMESTAMP_HEADER_TYPE: u8 = 8;

    let millis = date_time
        .duration_since(std::time::UNIX_EPOCH)
        .expect("signing time must be after the Unix epoch")
        .as_millis() as i64;

    let mut out = Vec::with_capacity(1 + NAME.len() + 1 + 8);
    out.push(NAME.len() as u8);
    out.extend_from_slice(NAME);
    out.push(TIMESTAMP_HEADER_TYPE);
    out.extend_from_slice(&millis.to_be_bytes());
    out
}

/// The SHA-256 hash (lowercase hex) of the non-signature-headers block for a message signed
/// at `date_time`. This is the "payload hash" half of the event-stream chunk string-to-sign.
pub fn non_signature_headers_hash(date_time: SystemTime) -> String {
    sha256_hex_string(&encode_date_header(date_time))
}

/// Builds the string-to-sign for one event-stream message and signs it with
/// `compute_signature`, chaining off `previous_signature` (the signature of the previous
/// message, or of the initial signed request for the first message in the stream).
pub fn sign_message(
    previous_signature: &str,
    date_time: SystemTime,
    credential_scope: &str,
    algorithm: &'static str,
    compute_signature: impl FnOnce(&[u8]) -> String,
) -> String {
    let formatted_date_time = date_time::format_date_time(date_time.into());
    let headers_hash = non_signature_headers_hash(date_time);
    let string_to_sign = format!(
        "{algorithm}-PAYLOAD\n{formatted_date_time}\n{credential_scope}\n{previous_signature}\n{headers_hash}\ne3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    compute_signature(string_to_sign.as_bytes())
}
