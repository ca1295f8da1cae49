// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR EAGAIN POLLIN

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use rustix::fd::BorrowedFd;
use std::{io, time::Duration};

/// How long a pull waits for the terminal to become readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadTimeout {
    /// Block until input arrives.
    #[default]
    Forever,
    /// Don't block. Lets a caller poll input alongside other work.
    Immediate,
    After(Duration),
}

impl From<ReadTimeout> for PollTimeout {
    fn from(timeout: ReadTimeout) -> Self {
        match timeout {
            ReadTimeout::Forever => PollTimeout::NONE,
            ReadTimeout::Immediate => PollTimeout::ZERO,
            ReadTimeout::After(duration) => {
                let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
                PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX)
            }
        }
    }
}

/// Something bytes can be pulled from: a readiness wait plus a read.
///
/// Implementations report errors as they happen, including
/// [`io::ErrorKind::Interrupted`] and [`io::ErrorKind::WouldBlock`]. Retrying is the
/// job of the caller ([`ByteReader`](super::ByteReader)).
pub trait InputSource {
    /// `Ok(true)` when a read would not block, `Ok(false)` when `timeout` elapsed.
    ///
    /// # Errors
    ///
    /// The OS error from the readiness wait.
    fn wait_readable(&mut self, timeout: ReadTimeout) -> io::Result<bool>;

    /// Reads up to `buf.len()` bytes. `Ok(0)` means end of input.
    ///
    /// # Errors
    ///
    /// The OS error from the read.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Reads from a terminal file descriptor using level-triggered `poll(2)` and
/// `read(2)`.
#[derive(Debug, Clone, Copy)]
pub struct FdSource<'fd> {
    fd: BorrowedFd<'fd>,
}

impl<'fd> FdSource<'fd> {
    #[must_use]
    pub fn new(fd: BorrowedFd<'fd>) -> Self { Self { fd } }
}

impl InputSource for FdSource<'_> {
    fn wait_readable(&mut self, timeout: ReadTimeout) -> io::Result<bool> {
        let mut poll_fds = [PollFd::new(self.fd, PollFlags::POLLIN)];
        let ready_count = poll(&mut poll_fds, timeout)?;
        // POLLHUP and POLLERR also count: the read that follows reports them.
        Ok(ready_count > 0)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(rustix::io::read(self.fd, buf)?)
    }
}

/// Writes straight to a terminal file descriptor with `write(2)`. There's no
/// userspace buffer, so [`flush()`](io::Write::flush) has nothing to do.
#[derive(Debug, Clone, Copy)]
pub struct FdWriter<'fd> {
    fd: BorrowedFd<'fd>,
}

impl<'fd> FdWriter<'fd> {
    #[must_use]
    pub fn new(fd: BorrowedFd<'fd>) -> Self { Self { fd } }
}

impl io::Write for FdWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(rustix::io::write(self.fd, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
