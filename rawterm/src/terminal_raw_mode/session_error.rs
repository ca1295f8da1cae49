// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::Diagnostic;
use nix::sys::signal::Signal;
use std::io;

/// Errors from opening, using or closing a [`RawModeSession`](crate::RawModeSession).
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum SessionError {
    #[error("a raw mode session is already active in this process")]
    #[diagnostic(
        code(rawterm::session::already_active),
        help("Drop the existing session, or pass `&RawModeSession` to the code that needs it.")
    )]
    AlreadyActive,

    #[error("stdin is not a terminal and /dev/tty could not be opened")]
    #[diagnostic(code(rawterm::session::no_terminal))]
    NoTerminal {
        #[source]
        source: io::Error,
    },

    #[error("failed to read terminal attributes")]
    #[diagnostic(
        code(rawterm::session::get_attributes),
        help("Is the input file descriptor a terminal?")
    )]
    GetAttributes {
        #[source]
        source: io::Error,
    },

    #[error("failed to set terminal attributes")]
    #[diagnostic(code(rawterm::session::set_attributes))]
    SetAttributes {
        #[source]
        source: io::Error,
    },

    #[error("failed to install the {signal:?} handler")]
    #[diagnostic(code(rawterm::session::signal_install))]
    SignalInstall {
        signal: Signal,
        #[source]
        source: nix::Error,
    },

    #[error("failed to write to the terminal")]
    #[diagnostic(code(rawterm::session::write))]
    Write {
        #[source]
        source: io::Error,
    },
}
