// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Puts the terminal back before a signal takes the process away from its normal
//! teardown path.
//!
//! ## Fatal signals
//!
//! For each of [`HandledSignal::FATAL`] the handler:
//! 1. Turns mouse tracking off, if a guard is alive.
//! 2. Applies the settings captured when the session opened.
//! 3. Reinstates the disposition that was in place before the session, or `SIG_DFL`.
//! 4. Re-raises the signal, so the process still dies (and dumps core) the way it
//!    would have without a session.
//!
//! The previous handler is never called directly. Re-raising lets the kernel pick
//! whatever the reinstated disposition says, default actions included.
//!
//! ## Suspend and resume
//!
//! ```text
//! SIGTSTP ─▶ install SIGCONT handler ─▶ restore terminal ─▶ reinstate old SIGTSTP ─▶ raise
//!                                                                      (process stops)
//! SIGCONT ─▶ install SIGTSTP handler ─▶ re-enter raw mode ─▶ reinstate old SIGCONT ─▶ raise
//! ```
//!
//! After a stop / continue cycle the dispositions and the terminal look exactly as
//! they did before the stop.
//!
//! ## Signal safety
//!
//! Handler bodies only make `sigaction()`, `tcsetattr()`, `write()` and `raise()`
//! calls, and read state through atomics. They never log, allocate or touch the input
//! parser.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Private modules (hide internal structure).
mod handled_signal;
mod signal_handlers;

// Re-exports.
pub use handled_signal::*;
pub(crate) use signal_handlers::*;
