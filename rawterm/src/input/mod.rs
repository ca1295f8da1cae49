// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Pulling input from the terminal.
//!
//! ```text
//! InputSource (poll + read) ─▶ ByteReader (buffer, retry) ─┬─▶ ByteStream  (raw bytes)
//!                                                          └─▶ EventStream (VtInputParser)
//! ```
//!
//! Both streams are lazy: nothing is read until the caller pulls. Each pull waits up to
//! a [`ReadTimeout`] for the terminal to become readable, retries `EINTR` / `EAGAIN`,
//! and turns any other OS error into [`InputError::SyscallFailed`].
//!
//! [`InputError::SyscallFailed`]: crate::InputError::SyscallFailed

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Private modules (hide internal structure).
mod byte_reader;
mod byte_stream;
mod event_stream;
mod input_source;

// Re-exports.
pub use byte_reader::*;
pub use byte_stream::*;
pub use event_stream::*;
pub use input_source::*;
