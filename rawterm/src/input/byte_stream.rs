// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{ByteReader, InputSource, Pulled, ReadTimeout};
use crate::{InputError, SessionConfig};

/// Raw terminal input, one byte at a time, with no decoding.
///
/// Use [`pull()`](Self::pull) to honor the configured [`ReadTimeout`]. The
/// [`Iterator`] impl keeps waiting through timeouts and ends at end of input or after
/// the first fatal error.
#[derive(Debug)]
pub struct ByteStream<S> {
    reader: ByteReader<S>,
    timeout: ReadTimeout,
}

impl<S: InputSource> ByteStream<S> {
    #[must_use]
    pub fn new(source: S, config: &SessionConfig) -> Self {
        Self {
            reader: ByteReader::new(source, config.read_buffer_size),
            timeout: config.read_timeout,
        }
    }

    /// # Errors
    ///
    /// [`InputError::SyscallFailed`] on a fatal read error. The stream is closed
    /// afterwards.
    pub fn pull(&mut self) -> Result<Pulled<u8>, InputError> {
        self.reader.next_byte(self.timeout)
    }
}

impl<S: InputSource> Iterator for ByteStream<S> {
    type Item = Result<u8, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.pull() {
                Ok(Pulled::Ready(byte)) => return Some(Ok(byte)),
                Ok(Pulled::TimedOut) => {}
                Ok(Pulled::Closed) => return None,
                Err(error) => return Some(Err(error)),
            }
        }
    }
}
