/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Byte I/O primitives: a single-producer/single-consumer async channel, a growable
//! staging buffer, and streaming checksum/gzip overlays, used to carry and verify
//! request and response bodies without depending on any higher-level HTTP types.

pub mod buffer;
pub mod channel;
pub mod error;
pub mod gzip;
pub mod hashing;

pub use buffer::SdkBuffer;
pub use channel::{channel, Reader, ReadOutcome, Writer};
pub use error::{ChannelClosed, ChannelError};
pub use hashing::{HashAlgorithm, HashingReader};
