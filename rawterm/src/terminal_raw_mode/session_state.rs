// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words TCSAFLUSH

//! Process-wide session state that signal handlers read.
//!
//! Everything here is async-signal-safe to read: atomics and [`SignalSafeCell`]s, no
//! locks and no allocation.

use crate::TerminalFds;
use rustix::{fd::BorrowedFd,
             termios::{OptionalActions, Termios, tcsetattr}};
use std::{cell::UnsafeCell,
          mem::MaybeUninit,
          sync::atomic::{AtomicBool, AtomicI32, Ordering}};

/// A value that a signal handler can read without taking a lock.
///
/// The `armed` flag is published after the value is written and cleared before it's
/// replaced, so a reader either sees a complete value or nothing.
///
/// Writers are the thread that opens and closes the session, and signal handlers
/// running on the thread they interrupted. Stored values are never dropped, so `T`
/// should be plain data.
pub(crate) struct SignalSafeCell<T> {
    armed: AtomicBool,
    value: UnsafeCell<MaybeUninit<T>>,
}

// SAFETY: Access to `value` is gated by `armed`, see the type docs.
unsafe impl<T: Send> Sync for SignalSafeCell<T> {}

impl<T> SignalSafeCell<T> {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    pub fn store(&self, value: T) {
        self.armed.store(false, Ordering::SeqCst);
        // SAFETY: Disarmed, so no reader looks at the slot while it's written.
        unsafe { (*self.value.get()).write(value) };
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        if !self.armed.load(Ordering::SeqCst) {
            return None;
        }
        // SAFETY: Armed means the value was fully written.
        Some(f(unsafe { (*self.value.get()).assume_init_ref() }))
    }

    pub fn is_set(&self) -> bool { self.armed.load(Ordering::SeqCst) }

    pub fn clear(&self) { self.armed.store(false, Ordering::SeqCst); }
}

impl<T: Clone> SignalSafeCell<T> {
    /// Reads the value and disarms the cell.
    pub fn take(&self) -> Option<T> {
        if !self.armed.swap(false, Ordering::SeqCst) {
            return None;
        }
        // SAFETY: It was armed, and stores only happen on this thread.
        Some(unsafe { (*self.value.get()).assume_init_ref() }.clone())
    }
}

/// Settings captured when the session opened.
pub(crate) static ORIGINAL_TERMIOS: SignalSafeCell<Termios> = SignalSafeCell::new();

/// Settings the session applied. Re-applied after `SIGCONT`.
pub(crate) static SESSION_TERMIOS: SignalSafeCell<Termios> = SignalSafeCell::new();

pub(crate) static INPUT_FD: AtomicI32 = AtomicI32::new(-1);
pub(crate) static OUTPUT_FD: AtomicI32 = AtomicI32::new(-1);

fn borrow_fd(fd_slot: &AtomicI32) -> Option<BorrowedFd<'static>> {
    let fd = fd_slot.load(Ordering::SeqCst);
    // SAFETY: Published while a session is open, and the session keeps the fd open.
    (fd >= 0).then(|| unsafe { BorrowedFd::borrow_raw(fd) })
}

pub(crate) fn publish_fds(fds: TerminalFds) {
    INPUT_FD.store(fds.input_raw(), Ordering::SeqCst);
    OUTPUT_FD.store(fds.output_raw(), Ordering::SeqCst);
}

pub(crate) fn output_fd() -> Option<BorrowedFd<'static>> { borrow_fd(&OUTPUT_FD) }

/// Applies [`ORIGINAL_TERMIOS`] with `TCSAFLUSH`. Async-signal-safe.
pub(crate) fn apply_original_termios() -> rustix::io::Result<()> {
    apply(&ORIGINAL_TERMIOS)
}

/// Applies [`SESSION_TERMIOS`] with `TCSAFLUSH`. Async-signal-safe.
pub(crate) fn apply_session_termios() -> rustix::io::Result<()> { apply(&SESSION_TERMIOS) }

/// Forgets the published fds and settings. Called after the terminal is restored.
pub(crate) fn clear() {
    INPUT_FD.store(-1, Ordering::SeqCst);
    OUTPUT_FD.store(-1, Ordering::SeqCst);
    SESSION_TERMIOS.clear();
    ORIGINAL_TERMIOS.clear();
}

fn apply(cell: &SignalSafeCell<Termios>) -> rustix::io::Result<()> {
    let Some(fd) = borrow_fd(&INPUT_FD) else {
        return Ok(());
    };
    cell.with(|termios| tcsetattr(fd, OptionalActions::Flush, termios))
        .unwrap_or(Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cell_lifecycle() {
        let cell: SignalSafeCell<u32> = SignalSafeCell::new();
        assert_eq!(cell.with(|it| *it), None);

        cell.store(7);
        assert!(cell.is_set());
        assert_eq!(cell.with(|it| *it + 1), Some(8));

        cell.store(9);
        assert_eq!(cell.take(), Some(9));
        assert_eq!(cell.take(), None);

        cell.store(1);
        cell.clear();
        assert!(!cell.is_set());
    }
}
