// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Gate ensuring only one [`RawModeSession`] exists at a time.
//!
//! - [`claim()`] marks a session as existing, or fails if one already does.
//! - [`release()`] resets, allowing a new session.
//!
//! [`RawModeSession`]: crate::RawModeSession

use crate::SessionError;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether a [`RawModeSession`](crate::RawModeSession) currently exists.
///
/// [`AtomicBool::swap()`] can't be poisoned, unlike a [`Mutex<bool>`]. The session
/// statics in [`session_state`](super::session_state) are only valid while this is
/// held.
///
/// [`Mutex<bool>`]: std::sync::Mutex
static SESSION_EXISTS: AtomicBool = AtomicBool::new(false);

/// # Errors
///
/// [`SessionError::AlreadyActive`] if a session already exists. Call [`release()`]
/// first.
pub fn claim() -> Result<(), SessionError> {
    // swap() returns the OLD value - false means there is no preexisting session.
    let session_already_exists = SESSION_EXISTS.swap(true, Ordering::SeqCst);
    if session_already_exists {
        return Err(SessionError::AlreadyActive);
    }
    Ok(())
}

/// Clears it, so that you can call [`claim()`] again.
pub fn release() { SESSION_EXISTS.store(false, Ordering::SeqCst); }
