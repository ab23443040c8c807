/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A single-producer/single-consumer asynchronous byte channel.
//!
//! Exactly one [`Writer`] and one [`Reader`] are created together by [`channel`]; a second
//! concurrent read or write is undefined behavior from the caller's perspective (the
//! implementation does not attempt to detect it). `flush`/`close` on the writer and
//! `cancel` on the reader are safe to call from any task at any time and are idempotent.

use crate::error::ChannelError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

struct Shared {
    buffer: Mutex<VecDeque<u8>>,
    capacity: usize,
    notify_readable: Notify,
    notify_writable: Notify,
    write_closed: Mutex<Option<Option<ChannelError>>>,
    read_cancelled: Mutex<Option<Option<ChannelError>>>,
    total_bytes_written: AtomicU64,
    read_closed: AtomicBool,
}

impl Shared {
    fn buffered_len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }
}

/// Creates a connected `(Writer, Reader)` pair backed by a buffer of at most `capacity`
/// bytes. `auto_flush = true` means every `write` call makes its bytes immediately
/// visible to the reader; `auto_flush = false` requires an explicit [`Writer::flush`]
/// (or the staging area filling up) to release buffered bytes.
pub fn channel(capacity: usize, auto_flush: bool) -> (Writer, Reader) {
    let shared = Arc::new(Shared {
        buffer: Mutex::new(VecDeque::with_capacity(capacity.min(8 * 1024))),
        capacity,
        notify_readable: Notify::new(),
        notify_writable: Notify::new(),
        write_closed: Mutex::new(None),
        read_cancelled: Mutex::new(None),
        total_bytes_written: AtomicU64::new(0),
        read_closed: AtomicBool::new(false),
    });
    (
        Writer {
            shared: shared.clone(),
            staging: Vec::new(),
            auto_flush,
        },
        Reader { shared },
    )
}

/// The write half of a [`channel`].
pub struct Writer {
    shared: Arc<Shared>,
    staging: Vec<u8>,
    auto_flush: bool,
}

/// The read half of a [`channel`].
pub struct Reader {
    shared: Arc<Shared>,
}

/// Outcome of [`Reader::read`]: either some bytes, or end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes (`1..=limit`) were appended to the sink.
    Bytes(usize),
    /// The writer has closed and no more bytes will ever arrive.
    EndOfStream,
}

fn read_cause(guard: &Option<Option<ChannelError>>) -> Option<Option<ChannelError>> {
    guard.clone()
}

impl Writer {
    /// Appends `source` to the channel, suspending while the internal buffer is full.
    /// Returns an error if the reader has cancelled the channel.
    pub async fn write(&mut self, source: &[u8]) -> Result<(), ChannelError> {
        self.check_not_closed()?;
        if self.auto_flush {
            self.write_visible(source).await?;
        } else {
            self.staging.extend_from_slice(source);
            if self.staging.len() >= self.shared.capacity {
                self.flush().await?;
            }
        }
        self.shared
            .total_bytes_written
            .fetch_add(source.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    async fn write_visible(&mut self, mut source: &[u8]) -> Result<(), ChannelError> {
        while !source.is_empty() {
            self.check_not_closed()?;
            let room = {
                let buf = self.shared.buffer.lock().unwrap();
                self.shared.capacity.saturating_sub(buf.len())
            };
            if room == 0 {
                self.shared.notify_writable.notified().await;
                continue;
            }
            let take = room.min(source.len());
            {
                let mut buf = self.shared.buffer.lock().unwrap();
                buf.extend(&source[..take]);
            }
            self.shared.notify_readable.notify_waiters();
            source = &source[take..];
        }
        Ok(())
    }

    /// Makes any staged (non-auto-flush) bytes visible to the reader.
    pub async fn flush(&mut self) -> Result<(), ChannelError> {
        if self.staging.is_empty() {
            return Ok(());
        }
        let staged = std::mem::take(&mut self.staging);
        self.write_visible(&staged).await
    }

    /// Closes the write side. `cause = Some(e)` transitions the channel to **failed**;
    /// every subsequent read (after already-buffered bytes are drained) raises `e`.
    /// Idempotent and safe to call from any task.
    pub fn close(&mut self, cause: Option<ChannelError>) {
        let mut guard = self.shared.write_closed.lock().unwrap();
        if guard.is_none() {
            *guard = Some(cause);
            drop(guard);
            self.shared.notify_readable.notify_waiters();
        }
    }

    /// Total bytes handed to `write` so far. Monotone, but not guaranteed atomic mid-write.
    pub fn total_bytes_written(&self) -> u64 {
        self.shared.total_bytes_written.load(Ordering::Relaxed)
    }

    fn check_not_closed(&self) -> Result<(), ChannelError> {
        if let Some(Some(cause)) = self.shared.read_cancelled.lock().unwrap().as_ref() {
            return Err(cause.clone());
        }
        Ok(())
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        self.close(None);
    }
}

impl Reader {
    /// Transfers up to `limit` bytes into `sink`, appending. Suspends only when the
    /// channel is empty and not yet closed for write.
    pub async fn read(&mut self, sink: &mut Vec<u8>, limit: usize) -> Result<ReadOutcome, ChannelError> {
        if limit == 0 {
            return Ok(ReadOutcome::Bytes(0));
        }
        loop {
            self.raise_if_cancelled()?;
            let mut buf = self.shared.buffer.lock().unwrap();
            if !buf.is_empty() {
                let take = limit.min(buf.len());
                sink.extend(buf.drain(..take));
                drop(buf);
                self.shared.notify_writable.notify_waiters();
                self.maybe_mark_closed_for_read();
                return Ok(ReadOutcome::Bytes(take));
            }
            drop(buf);
            if let Some(cause) = self.write_closed_cause()? {
                self.shared.read_closed.store(true, Ordering::Relaxed);
                return match cause {
                    Some(e) => Err(e),
                    None => Ok(ReadOutcome::EndOfStream),
                };
            }
            self.shared.notify_readable.notified().await;
        }
    }

    /// Suspends until exactly `n` bytes have been delivered into a freshly allocated
    /// buffer, or fails if the channel closes (with or without a cause) before then.
    pub async fn read_fully(&mut self, n: usize) -> Result<Vec<u8>, ChannelError> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.read(&mut out, n - out.len()).await? {
                ReadOutcome::Bytes(_) => {}
                ReadOutcome::EndOfStream => {
                    return Err(ChannelError::new(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("channel closed after {} of {n} requested bytes", out.len()),
                    )));
                }
            }
        }
        Ok(out)
    }

    /// Drains whatever is currently buffered (at least one byte) without suspending
    /// unless the channel is empty, in which case it behaves like [`Reader::read`].
    pub async fn read_available(&mut self, sink: &mut Vec<u8>, limit: usize) -> Result<ReadOutcome, ChannelError> {
        self.read(sink, limit).await
    }

    /// Resolves once at least one byte is available to read, or the writer has closed.
    /// Returns `true` if content is available, `false` if the channel is drained and closed.
    pub async fn await_content(&mut self) -> Result<bool, ChannelError> {
        loop {
            self.raise_if_cancelled()?;
            if self.shared.buffered_len() > 0 {
                return Ok(true);
            }
            if let Some(cause) = self.write_closed_cause()? {
                return match cause {
                    Some(e) => Err(e),
                    None => Ok(false),
                };
            }
            self.shared.notify_readable.notified().await;
        }
    }

    /// `true` once the writer has closed, regardless of whether buffered bytes remain.
    pub fn is_closed_for_write(&self) -> bool {
        self.shared.write_closed.lock().unwrap().is_some()
    }

    /// `true` only after the writer has closed *and* all buffered bytes have been
    /// consumed by the reader.
    pub fn is_closed_for_read(&self) -> bool {
        self.shared.read_closed.load(Ordering::Relaxed)
    }

    /// Total bytes the writer has handed to `write` so far.
    pub fn total_bytes_written(&self) -> u64 {
        self.shared.total_bytes_written.load(Ordering::Relaxed)
    }

    /// Cancels the read side. Symmetric to [`Writer::close`]: subsequent operations on
    /// this reader raise `cause` (if any) once already-buffered bytes are drained; the
    /// writer observes cancellation via its `write` calls returning an error immediately.
    pub fn cancel(&mut self, cause: Option<ChannelError>) {
        let mut guard = self.shared.read_cancelled.lock().unwrap();
        if guard.is_none() {
            *guard = Some(cause);
            drop(guard);
            self.shared.notify_writable.notify_waiters();
        }
    }

    fn maybe_mark_closed_for_read(&self) {
        if self.shared.buffered_len() == 0 && self.is_closed_for_write() {
            self.shared.read_closed.store(true, Ordering::Relaxed);
        }
    }

    fn raise_if_cancelled(&self) -> Result<(), ChannelError> {
        if let Some(Some(cause)) = read_cause(&self.shared.read_cancelled.lock().unwrap()) {
            return Err(cause);
        }
        Ok(())
    }

    fn write_closed_cause(&self) -> Result<Option<Option<ChannelError>>, ChannelError> {
        Ok(read_cause(&self.shared.write_closed.lock().unwrap()))
    }
}
