// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Knobs for a [`RawModeSession`](crate::RawModeSession) and the streams it hands out.

use crate::{NulKeyPolicy, RawModePreset, ReadTimeout};
use std::time::Duration;

/// Bytes requested per `read()` when the caller doesn't say otherwise.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 32;

/// How long [`RawModeSession::cursor_position()`] waits for the terminal's reply.
///
/// [`RawModeSession::cursor_position()`]: crate::RawModeSession::cursor_position
pub const DEFAULT_CURSOR_QUERY_TIMEOUT: Duration = Duration::from_millis(500);

/// Session configuration. Start from [`Default`] and adjust with the `with_*` methods.
///
/// ```
/// use rawterm::{RawModePreset, ReadTimeout, SessionConfig};
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_preset(RawModePreset::Cbreak)
///     .with_read_timeout(ReadTimeout::After(Duration::from_millis(100)));
/// assert_eq!(config.preset, RawModePreset::Cbreak);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Which line discipline flags to clear.
    pub preset: RawModePreset,
    /// Install the fatal signal and `SIGTSTP` handlers that restore the terminal.
    pub install_signal_handlers: bool,
    /// Size of the buffer each stream reads into.
    pub read_buffer_size: usize,
    /// How long a stream [`pull()`](crate::EventStream::pull) waits for input.
    pub read_timeout: ReadTimeout,
    /// Decode a lone `ESC` as the Escape key when nothing follows it within this
    /// time. [`None`] waits for the next byte.
    pub esc_timeout: Option<Duration>,
    pub nul_key: NulKeyPolicy,
    /// [`None`] waits for the terminal's reply indefinitely.
    pub cursor_query_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preset: RawModePreset::Raw,
            install_signal_handlers: true,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            read_timeout: ReadTimeout::Forever,
            esc_timeout: None,
            nul_key: NulKeyPolicy::default(),
            cursor_query_timeout: Some(DEFAULT_CURSOR_QUERY_TIMEOUT),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_preset(mut self, preset: RawModePreset) -> Self {
        self.preset = preset;
        self
    }

    #[must_use]
    pub fn with_signal_handlers(mut self, install: bool) -> Self {
        self.install_signal_handlers = install;
        self
    }

    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, timeout: ReadTimeout) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_esc_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.esc_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_nul_key(mut self, policy: NulKeyPolicy) -> Self {
        self.nul_key = policy;
        self
    }

    #[must_use]
    pub fn with_cursor_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.cursor_query_timeout = timeout;
        self
    }
}
