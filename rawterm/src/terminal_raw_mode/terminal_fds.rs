// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use rustix::fd::{BorrowedFd, RawFd};

/// The file descriptors a session reads input from and writes control sequences to.
///
/// Usually `stdin` and `stdout`. Held as raw numbers so the signal handlers can use
/// them from process-wide statics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalFds {
    input: RawFd,
    output: RawFd,
}

impl TerminalFds {
    #[must_use]
    pub fn stdio() -> Self { Self { input: 0, output: 1 } }

    /// # Safety
    ///
    /// Both descriptors must stay open for as long as a
    /// [`RawModeSession`](crate::RawModeSession) uses them.
    #[must_use]
    pub unsafe fn from_raw(input: RawFd, output: RawFd) -> Self { Self { input, output } }

    #[must_use]
    pub fn input_raw(&self) -> RawFd { self.input }

    #[must_use]
    pub fn output_raw(&self) -> RawFd { self.output }

    #[must_use]
    pub fn input(&self) -> BorrowedFd<'_> {
        // SAFETY: `stdio()` fds are open for the life of the process, and `from_raw()`
        // callers promise to keep theirs open.
        unsafe { BorrowedFd::borrow_raw(self.input) }
    }

    #[must_use]
    pub fn output(&self) -> BorrowedFd<'_> {
        // SAFETY: See `input()`.
        unsafe { BorrowedFd::borrow_raw(self.output) }
    }
}
