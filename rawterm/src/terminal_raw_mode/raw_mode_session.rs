// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words isatty TCSAFLUSH NOCTTY

use super::{at_most_one_session, mouse_tracking, session_state};
use crate::{ByteStream, CursorPosition, EventStream, FdSource, FdWriter, MouseTrackingGuard,
            RawModePreset, SessionConfig, SessionError, TerminalFds, TerminalSize,
            get_terminal_size_of, query_cursor_position, signal_restore};
use rustix::{fd::{AsRawFd, OwnedFd},
             termios::{self, OptionalActions, Termios}};
use std::{fs::File, io};

/// Enable or disable debug logging for the session lifecycle.
pub const DEBUG_RAWTERM_SESSION: bool = true;

/// The terminal is in raw (or cbreak) mode for as long as this is alive.
///
/// There is at most one per process, see [`SessionError::AlreadyActive`]. Dropping it
/// restores the settings captured by [`open()`](Self::open). Use
/// [`close()`](Self::close) instead to find out whether that worked.
///
/// See the [module docs](mod@crate::terminal_raw_mode) for the full lifecycle.
#[derive(Debug)]
pub struct RawModeSession {
    fds: TerminalFds,
    config: SessionConfig,
    /// `/dev/tty`, when stdio isn't a terminal. Closed after the session is torn down.
    controlling_tty: Option<OwnedFd>,
    closed: bool,
}

impl RawModeSession {
    /// Opens a session on stdin / stdout, or on `/dev/tty` when either of them is
    /// redirected (eg: `echo "data" | your_app`).
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoTerminal`] if stdio is redirected and there's no controlling
    ///   terminal.
    /// - Anything [`open_on()`](Self::open_on) returns.
    pub fn open(config: SessionConfig) -> Result<Self, SessionError> {
        if termios::isatty(io::stdin()) && termios::isatty(io::stdout()) {
            return Self::open_on(TerminalFds::stdio(), config);
        }

        let tty: OwnedFd = File::options()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map_err(|source| SessionError::NoTerminal { source })?
            .into();
        // SAFETY: `tty` is owned by the session and outlives its use of the fds.
        let fds = unsafe { TerminalFds::from_raw(tty.as_raw_fd(), tty.as_raw_fd()) };
        Self::start(fds, config, Some(tty))
    }

    /// Opens a session on the given terminal.
    ///
    /// # Errors
    ///
    /// - [`SessionError::AlreadyActive`] if another session is alive.
    /// - [`SessionError::GetAttributes`] if `fds.input()` is not a terminal.
    /// - [`SessionError::SignalInstall`] if a handler can't be installed.
    /// - [`SessionError::SetAttributes`] if the new settings are rejected.
    pub fn open_on(fds: TerminalFds, config: SessionConfig) -> Result<Self, SessionError> {
        Self::start(fds, config, None)
    }

    fn start(
        fds: TerminalFds,
        config: SessionConfig,
        controlling_tty: Option<OwnedFd>,
    ) -> Result<Self, SessionError> {
        at_most_one_session::claim()?;

        if let Err(error) = enter(fds, &config) {
            // Undo whatever part of `enter()` ran. The original error is the one to
            // report.
            drop(leave(config.install_signal_handlers));
            at_most_one_session::release();
            return Err(error);
        }

        DEBUG_RAWTERM_SESSION.then(|| {
            // % is Display, ? is Debug.
            tracing::debug!(
                message = "raw mode session opened",
                preset = %config.preset,
                input_fd = fds.input_raw(),
                output_fd = fds.output_raw(),
                signal_handlers = config.install_signal_handlers,
            );
        });

        Ok(Self {
            fds,
            config,
            controlling_tty,
            closed: false,
        })
    }

    #[must_use]
    pub fn fds(&self) -> TerminalFds { self.fds }

    #[must_use]
    pub fn config(&self) -> &SessionConfig { &self.config }

    /// The settings that will be restored when the session ends.
    #[must_use]
    pub fn original_termios(&self) -> Option<Termios> {
        session_state::ORIGINAL_TERMIOS.with(Clone::clone)
    }

    /// Turns on any-event mouse tracking with SGR reports until the guard is dropped.
    ///
    /// # Errors
    ///
    /// [`SessionError::Write`] if the enable sequence can't be written.
    pub fn enable_mouse_tracking(&self) -> Result<MouseTrackingGuard<'_>, SessionError> {
        MouseTrackingGuard::acquire(self)
    }

    /// Asks the terminal where the cursor is. Returns [`CursorPosition::INVALID`] if
    /// the terminal doesn't answer within
    /// [`SessionConfig::cursor_query_timeout`] or answers with garbage.
    ///
    /// Don't call this while an [`EventStream`] has bytes buffered, the reply would be
    /// interleaved with them.
    #[must_use]
    pub fn cursor_position(&self) -> CursorPosition {
        query_cursor_position(
            &mut FdSource::new(self.fds.input()),
            &mut FdWriter::new(self.fds.output()),
            self.config.cursor_query_timeout,
        )
    }

    /// Raw bytes typed into the terminal.
    #[must_use]
    pub fn input_stream(&self) -> ByteStream<FdSource<'_>> {
        ByteStream::new(FdSource::new(self.fds.input()), &self.config)
    }

    /// Decoded key and mouse events.
    #[must_use]
    pub fn event_stream(&self) -> EventStream<FdSource<'_>> {
        EventStream::new(FdSource::new(self.fds.input()), &self.config)
    }

    /// Size of the session's terminal, honoring `COLUMNS` / `LINES`.
    #[must_use]
    pub fn terminal_size(&self) -> TerminalSize { get_terminal_size_of(self.fds.output()) }

    /// Ends the session and restores the original settings.
    ///
    /// # Errors
    ///
    /// [`SessionError::SetAttributes`] if the original settings can't be applied. The
    /// session is over either way.
    pub fn close(mut self) -> Result<(), SessionError> { self.teardown() }

    fn teardown(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = leave(self.config.install_signal_handlers);
        at_most_one_session::release();

        DEBUG_RAWTERM_SESSION.then(|| {
            // % is Display, ? is Debug.
            tracing::debug!(
                message = "raw mode session closed",
                restored = result.is_ok(),
                controlling_tty = self.controlling_tty.is_some(),
            );
        });

        result
    }
}

impl Drop for RawModeSession {
    fn drop(&mut self) {
        if let Err(error) = self.teardown() {
            tracing::warn!(message = "failed to restore terminal settings", error = ?error);
        }
    }
}

/// Captures the current settings, publishes them for the signal handlers, and switches
/// the terminal to `config.preset`.
fn enter(fds: TerminalFds, config: &SessionConfig) -> Result<(), SessionError> {
    let original = termios::tcgetattr(fds.input())
        .map_err(|errno| SessionError::GetAttributes { source: errno.into() })?;
    let mut raw = original.clone();
    config.preset.apply(&mut raw);

    session_state::publish_fds(fds);
    session_state::ORIGINAL_TERMIOS.store(original);
    session_state::SESSION_TERMIOS.store(raw.clone());

    if config.install_signal_handlers {
        signal_restore::install_handlers()?;
    }

    termios::tcsetattr(fds.input(), OptionalActions::Flush, &raw)
        .map_err(|errno| SessionError::SetAttributes { source: errno.into() })
}

/// Reverse of [`enter()`]. Safe to call after a partial `enter()`.
///
/// The handlers stay installed until the terminal is restored, so a signal arriving in
/// between still finds it in a known state.
fn leave(uninstall_signal_handlers: bool) -> Result<(), SessionError> {
    mouse_tracking::reset_mouse_tracking();
    let restored = session_state::apply_original_termios();
    if uninstall_signal_handlers {
        signal_restore::uninstall_handlers();
    }
    session_state::clear();
    restored.map_err(|errno| SessionError::SetAttributes { source: errno.into() })
}

/// Opens a [`RawModePreset::Raw`] session, runs `f`, and closes the session.
///
/// # Errors
///
/// See [`RawModeSession::open()`] and [`RawModeSession::close()`].
pub fn with_raw_mode<R>(
    config: SessionConfig,
    f: impl FnOnce(&RawModeSession) -> R,
) -> Result<R, SessionError> {
    with_session(config.with_preset(RawModePreset::Raw), f)
}

/// Opens a [`RawModePreset::Cbreak`] session, runs `f`, and closes the session.
///
/// # Errors
///
/// See [`RawModeSession::open()`] and [`RawModeSession::close()`].
pub fn with_cbreak_mode<R>(
    config: SessionConfig,
    f: impl FnOnce(&RawModeSession) -> R,
) -> Result<R, SessionError> {
    with_session(config.with_preset(RawModePreset::Cbreak), f)
}

fn with_session<R>(
    config: SessionConfig,
    f: impl FnOnce(&RawModeSession) -> R,
) -> Result<R, SessionError> {
    let session = RawModeSession::open(config)?;
    let it = f(&session);
    session.close()?;
    Ok(it)
}
