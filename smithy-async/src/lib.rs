/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Async runtime agnostic abstractions: an injectable sleep provider and an injectable
//! time source, so the retry strategy, rate limiter, and signer never call
//! `tokio::time::sleep`/`SystemTime::now()` directly and remain testable with
//! deterministic clocks.

pub mod rt {
    //! Runtime abstractions.
    pub mod sleep;
}
pub mod time;

pub use rt::sleep::{AsyncSleep, SharedAsyncSleep, Sleep};
pub use time::{ManualTimeSource, SharedTimeSource, SystemTimeSource, TimeSource};
