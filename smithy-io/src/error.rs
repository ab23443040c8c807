/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Error type shared by the channel and buffer primitives.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// An error that closed a [`crate::channel::ByteChannel`], preserved by identity across
/// every subsequent read or write so callers can distinguish "this channel failed because
/// of X" from "a new, unrelated failure happened on a later call".
#[derive(Clone)]
pub struct ChannelError(Arc<dyn StdError + Send + Sync + 'static>);

impl ChannelError {
    /// Wraps any error as a `ChannelError`.
    pub fn new(source: impl StdError + Send + Sync + 'static) -> Self {
        Self(Arc::new(source))
    }

    /// Returns `true` if `self` and `other` were constructed from the same underlying
    /// `close`/`cancel` call (pointer identity on the shared error), matching the
    /// "preserved identity" requirement for repeated reads after a channel fails.
    pub fn is_same_cause(&self, other: &ChannelError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for ChannelError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// A plain end-of-stream/closed marker used when a channel is closed without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

impl fmt::Display for ChannelClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel closed")
    }
}

impl StdError for ChannelClosed {}
