// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # rawterm
//!
//! Put a POSIX terminal into raw or cbreak mode for the lifetime of a session, and get
//! it back to exactly how you found it, even when the process is killed by a fatal
//! signal or suspended with `Ctrl+Z`.
//!
//! While the session is open you can:
//!
//! - Pull decoded [`Event`]s (keys with modifiers, arrows, function keys, SGR mouse
//!   reports) from [`RawModeSession::event_stream()`].
//! - Pull raw bytes from [`RawModeSession::input_stream()`].
//! - Ask the terminal where the cursor is with
//!   [`RawModeSession::cursor_position()`].
//! - Turn on mouse tracking with [`RawModeSession::enable_mouse_tracking()`], which
//!   returns a guard that turns it back off.
//!
//! [`get_terminal_size()`] works with or without a session.
//!
//! ```no_run
//! use rawterm::{SessionConfig, with_raw_mode};
//!
//! # fn main() -> miette::Result<()> {
//! with_raw_mode(SessionConfig::default(), |session| {
//!     for event in session.event_stream() {
//!         match event {
//!             Ok(event) => {
//!                 if event.key().is_some_and(|key| key.is_ctrl_char('d')) {
//!                     break;
//!                 }
//!             }
//!             Err(error) if error.is_protocol_violation() => continue,
//!             Err(_) => break,
//!         }
//!     }
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! # Layering
//!
//! | Layer                        | Module                          |
//! | :--------------------------- | :------------------------------ |
//! | terminal size query          | [`mod@term_size`]               |
//! | raw mode session             | [`mod@terminal_raw_mode`]       |
//! | signal restoration           | [`mod@signal_restore`]          |
//! | escape sequence decoder      | [`mod@vt_100_input_parser`]     |
//! | readiness wait + read driver | [`mod@input`]                   |
//! | cursor position query        | [`mod@cursor_position`]         |

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![warn(clippy::all)]
#![warn(clippy::unwrap_in_result)]
#![warn(rust_2018_idioms)]
// Production code must propagate errors. Tests may unwrap.
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod config;
pub mod cursor_position;
pub mod input;
pub mod log;
pub mod signal_restore;
pub mod term_size;
pub mod terminal_raw_mode;
pub mod vt_100_input_parser;

#[cfg(test)]
pub mod test_fixtures;

// Re-export.
pub use config::*;
pub use cursor_position::*;
pub use input::*;
pub use log::*;
pub use term_size::*;
pub use terminal_raw_mode::*;
pub use vt_100_input_parser::*;
