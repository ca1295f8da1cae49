// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Any-event mouse tracking (`?1003`) with SGR extended reports (`?1006`).

use super::session_state;
use crate::{RawModeSession, SessionError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Turns on any-event tracking, then SGR encoding.
pub const MOUSE_TRACKING_ENABLE: &[u8] = b"\x1b[?1003h\x1b[?1006h";

/// Turns off SGR encoding, then any-event tracking.
pub const MOUSE_TRACKING_DISABLE: &[u8] = b"\x1b[?1006l\x1b[?1003l";

/// Number of live [`MouseTrackingGuard`]s. Signal handlers use it to decide whether to
/// write [`MOUSE_TRACKING_DISABLE`] / [`MOUSE_TRACKING_ENABLE`].
static MOUSE_TRACKING_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// Keeps mouse tracking on while it's alive.
///
/// Guards nest: the enable sequence is written when the first guard is created and the
/// disable sequence when the last one is dropped. So enabling twice and dropping one
/// guard leaves tracking on.
#[must_use = "mouse tracking is turned off when the guard is dropped"]
#[derive(Debug)]
pub struct MouseTrackingGuard<'session> {
    _session: &'session RawModeSession,
}

impl<'session> MouseTrackingGuard<'session> {
    pub(crate) fn acquire(session: &'session RawModeSession) -> Result<Self, SessionError> {
        if MOUSE_TRACKING_DEPTH.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Err(error) = write_to_terminal(MOUSE_TRACKING_ENABLE) {
                MOUSE_TRACKING_DEPTH.fetch_sub(1, Ordering::SeqCst);
                return Err(SessionError::Write { source: std::io::Error::from(error) });
            }
            tracing::debug!(message = "mouse tracking enabled");
        }
        Ok(Self { _session: session })
    }
}

impl Drop for MouseTrackingGuard<'_> {
    fn drop(&mut self) {
        if MOUSE_TRACKING_DEPTH.fetch_sub(1, Ordering::SeqCst) == 1 {
            if let Err(error) = write_to_terminal(MOUSE_TRACKING_DISABLE) {
                tracing::warn!(message = "failed to disable mouse tracking", error = ?error);
            }
            tracing::debug!(message = "mouse tracking disabled");
        }
    }
}

/// `true` while at least one [`MouseTrackingGuard`] is alive.
#[must_use]
pub fn is_mouse_tracking_active() -> bool { MOUSE_TRACKING_DEPTH.load(Ordering::SeqCst) > 0 }

/// Async-signal-safe.
pub(crate) fn write_disable_if_active() {
    if is_mouse_tracking_active() {
        write_to_terminal(MOUSE_TRACKING_DISABLE).ok();
    }
}

/// Async-signal-safe.
pub(crate) fn write_enable_if_active() {
    if is_mouse_tracking_active() {
        write_to_terminal(MOUSE_TRACKING_ENABLE).ok();
    }
}

/// Turns tracking off if a guard was leaked. Called when the session closes.
pub(crate) fn reset_mouse_tracking() {
    if MOUSE_TRACKING_DEPTH.swap(0, Ordering::SeqCst) > 0 {
        write_to_terminal(MOUSE_TRACKING_DISABLE).ok();
    }
}

/// Writes all of `bytes` to the session's output fd with `write(2)`. Async-signal-safe.
fn write_to_terminal(bytes: &[u8]) -> rustix::io::Result<()> {
    let Some(fd) = session_state::output_fd() else {
        return Err(rustix::io::Errno::BADF);
    };
    let mut rest = bytes;
    while !rest.is_empty() {
        match rustix::io::write(fd, rest) {
            Ok(written) => rest = &rest[written..],
            Err(rustix::io::Errno::INTR) => {}
            Err(error) => return Err(error),
        }
    }
    Ok(())
}
