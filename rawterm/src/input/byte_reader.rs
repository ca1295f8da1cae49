// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR EAGAIN EWOULDBLOCK

use super::{InputSource, ReadTimeout};
use crate::InputError;
use std::io;

/// Outcome of one pull from a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulled<T> {
    Ready(T),
    /// The readiness wait timed out before anything could be produced.
    TimedOut,
    /// End of input, or the stream already failed. Every later pull returns this too.
    Closed,
}

/// Buffered byte-at-a-time reader on top of an [`InputSource`].
///
/// - `EINTR`, `EAGAIN` and `EWOULDBLOCK` from either the wait or the read are retried.
/// - Any other error is returned once as [`InputError::SyscallFailed`], then the reader
///   is closed.
/// - A zero-byte read closes the reader.
#[derive(Debug)]
pub struct ByteReader<S> {
    source: S,
    buffer: Box<[u8]>,
    start: usize,
    end: usize,
    closed: bool,
}

impl<S: InputSource> ByteReader<S> {
    /// `buffer_size` is clamped to at least 1.
    #[must_use]
    pub fn new(source: S, buffer_size: usize) -> Self {
        Self {
            source,
            buffer: vec![0; buffer_size.max(1)].into_boxed_slice(),
            start: 0,
            end: 0,
            closed: false,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed }

    /// Bytes already read from the source but not handed out yet.
    #[must_use]
    pub fn buffered(&self) -> &[u8] { &self.buffer[self.start..self.end] }

    /// Returns the next byte, reading from the source when the buffer is empty.
    ///
    /// # Errors
    ///
    /// [`InputError::SyscallFailed`] when the wait or the read fails for a reason other
    /// than an interruption or a spurious wakeup.
    pub fn next_byte(&mut self, timeout: ReadTimeout) -> Result<Pulled<u8>, InputError> {
        if let Some(byte) = self.pop_buffered() {
            return Ok(Pulled::Ready(byte));
        }
        if self.closed {
            return Ok(Pulled::Closed);
        }

        loop {
            match self.source.wait_readable(timeout) {
                Ok(true) => {}
                Ok(false) => return Ok(Pulled::TimedOut),
                Err(error) if is_transient(&error) => continue,
                Err(error) => return Err(self.fail("poll", error)),
            }

            match self.source.read(&mut self.buffer) {
                Ok(0) => {
                    tracing::debug!(message = "ByteReader: end of input");
                    self.closed = true;
                    return Ok(Pulled::Closed);
                }
                Ok(read_count) => {
                    self.start = 0;
                    self.end = read_count;
                    if let Some(byte) = self.pop_buffered() {
                        return Ok(Pulled::Ready(byte));
                    }
                }
                Err(error) if is_transient(&error) => {}
                Err(error) => return Err(self.fail("read", error)),
            }
        }
    }

    fn pop_buffered(&mut self) -> Option<u8> {
        let byte = *self.buffer.get(self.start..self.end)?.first()?;
        self.start += 1;
        Some(byte)
    }

    fn fail(&mut self, call: &'static str, error: io::Error) -> InputError {
        tracing::debug!(message = "ByteReader: closing after fatal error", call, error = ?error);
        self.closed = true;
        InputError::syscall(call, error)
    }
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}
