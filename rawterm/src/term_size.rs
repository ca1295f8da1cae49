// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words winsize tcgetwinsize TIOCGWINSZ

use rustix::fd::AsFd;
use std::io;

/// Columns and rows of the terminal. [`TerminalSize::INVALID`] when the size can't be
/// determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalSize {
    pub cols: i32,
    pub rows: i32,
}

impl TerminalSize {
    pub const INVALID: Self = Self { cols: -1, rows: -1 };

    #[must_use]
    pub fn is_valid(&self) -> bool { *self != Self::INVALID }
}

/// Environment variables that override the size reported by the kernel.
pub const COLUMNS_ENV_VAR: &str = "COLUMNS";
pub const LINES_ENV_VAR: &str = "LINES";

/// Get the terminal size of `stdout`.
///
/// 1. If both `COLUMNS` and `LINES` are set and parse as integers, they win.
/// 2. Otherwise ask the kernel with [`tcgetwinsize`] (`TIOCGWINSZ`).
/// 3. If that fails, return [`TerminalSize::INVALID`].
///
/// Doesn't need a [`RawModeSession`](crate::RawModeSession).
///
/// [`tcgetwinsize`]: fn@rustix::termios::tcgetwinsize
#[must_use]
pub fn get_terminal_size() -> TerminalSize { get_terminal_size_of(io::stdout()) }

/// Same as [`get_terminal_size()`] for any terminal file descriptor.
#[must_use]
pub fn get_terminal_size_of(fd: impl AsFd) -> TerminalSize {
    resolve_terminal_size(
        |name| std::env::var(name).ok(),
        || {
            let winsize = rustix::termios::tcgetwinsize(fd)?;
            Ok((winsize.ws_col, winsize.ws_row))
        },
    )
}

/// `query_kernel` returns `(cols, rows)`.
fn resolve_terminal_size(
    lookup_env: impl Fn(&str) -> Option<String>,
    query_kernel: impl FnOnce() -> io::Result<(u16, u16)>,
) -> TerminalSize {
    let parse = |name: &str| lookup_env(name)?.trim().parse::<i32>().ok();
    if let (Some(cols), Some(rows)) = (parse(COLUMNS_ENV_VAR), parse(LINES_ENV_VAR)) {
        return TerminalSize { cols, rows };
    }

    match query_kernel() {
        Ok((cols, rows)) => TerminalSize { cols: i32::from(cols), rows: i32::from(rows) },
        Err(error) => {
            tracing::debug!(message = "tcgetwinsize failed", error = ?error);
            TerminalSize::INVALID
        }
    }
}
