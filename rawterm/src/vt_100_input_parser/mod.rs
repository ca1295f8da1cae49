// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Decoding terminal input bytes into [`Event`]s.
//!
//! - `types`: the packed [`Event`] and its [`KeyEvent`] / [`MouseEvent`] views.
//! - `stateful_parser`: [`VtInputParser`], the byte-at-a-time state machine.
//! - `error`: [`InputError`], shared with the [`input`](mod@crate::input) streams.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Private modules (hide internal structure).
mod error;
mod stateful_parser;
mod types;

// Re-exports.
pub use error::*;
pub use stateful_parser::*;
pub use types::*;
