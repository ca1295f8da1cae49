// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Raw mode sessions for POSIX terminals.
//!
//! ## Raw Mode vs Cooked Mode
//!
//! **Cooked Mode** (default):
//! - Input is line-buffered (waits for Enter key)
//! - Special characters are interpreted (Ctrl+C, Ctrl+Z, etc.)
//! - Echoing is enabled (typed characters appear on screen)
//!
//! **Raw Mode** ([`RawModePreset::Raw`]):
//! - No line buffering, bytes are available immediately
//! - No echo
//! - Ctrl+C and Ctrl+Z arrive as bytes instead of signals
//!
//! **Cbreak Mode** ([`RawModePreset::Cbreak`]) is raw mode that keeps signal generation,
//! so Ctrl+C still interrupts and Ctrl+Z still suspends.
//!
//! ## The `stty` Command
//!
//! `stty` edits the same **termios** settings this module does, which makes it handy
//! for checking that a session cleaned up after itself:
//!
//! ```bash
//! stty -a          # icanon, echo and isig should all be on after the program exits
//! stty sane        # recover a terminal left in raw mode by a crashed program
//! ```
//!
//! ## Session lifecycle
//!
//! [`RawModeSession::open()`]:
//! 1. Claims the process-wide session slot. A second session is an error, see
//!    [`SessionError::AlreadyActive`].
//! 2. Snapshots the current termios settings with `tcgetattr()`.
//! 3. Installs the signal handlers from [`mod@crate::signal_restore`], which restore the
//!    snapshot before a fatal signal or a suspend takes effect.
//! 4. Clears the preset's flags and applies them with `tcsetattr(TCSAFLUSH)`.
//!
//! Dropping the session (or [`RawModeSession::close()`]) undoes all of it, in reverse.
//!
//! The snapshot, the terminal file descriptors and the mouse tracking depth live in
//! process-wide statics so the signal handlers can reach them without allocating or
//! locking.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Private modules (hide internal structure).
mod at_most_one_session;
mod raw_mode_preset;
mod raw_mode_session;
mod session_error;
mod terminal_fds;

// Crate-visible, the signal handlers use these.
pub(crate) mod mouse_tracking;
pub(crate) mod session_state;

// Re-exports.
pub use mouse_tracking::*;
pub use raw_mode_preset::*;
pub use raw_mode_session::*;
pub use session_error::*;
pub use terminal_fds::*;
