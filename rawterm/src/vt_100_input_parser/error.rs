// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::Diagnostic;
use smallvec::SmallVec;
use std::io;

/// At most this many numeric parameters are accepted in one control sequence.
pub const MAX_PARAMS: usize = 4;

/// Numeric parameters of a control sequence. Never spills to the heap because the
/// parser rejects a sequence before it grows past [`MAX_PARAMS`].
pub type ParamList = SmallVec<[u16; MAX_PARAMS]>;

/// Everything that can go wrong while pulling bytes or events from the terminal.
///
/// Two families:
/// - **Fatal I/O** ([`SyscallFailed`]): the stream is finished.
/// - **Protocol violations** (all other variants): the offending sequence is dropped,
///   the parser skips the rest of it, and the next pull continues after it. See
///   [`is_protocol_violation()`].
///
/// [`SyscallFailed`]: InputError::SyscallFailed
/// [`is_protocol_violation()`]: InputError::is_protocol_violation
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum InputError {
    #[error("system call `{call}` failed while reading terminal input")]
    #[diagnostic(
        code(rawterm::input::syscall_failed),
        help("The input stream is closed. Open a new stream to keep reading.")
    )]
    SyscallFailed {
        call: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("invalid control sequence start: ESC [ {byte:#04x}")]
    #[diagnostic(code(rawterm::input::invalid_sequence_start))]
    InvalidSequenceStart { byte: u8 },

    #[error(
        "unfinished numeric sequence: params {params:?}, unexpected terminator {terminator:#04x}"
    )]
    #[diagnostic(code(rawterm::input::unfinished_numeric_sequence))]
    UnfinishedNumericSequence { params: ParamList, terminator: u8 },

    #[error("input ended inside a numeric sequence: params {params:?}")]
    #[diagnostic(code(rawterm::input::truncated_numeric_sequence))]
    TruncatedNumericSequence { params: ParamList },

    #[error("control sequence has more than {limit} numeric parameters")]
    #[diagnostic(code(rawterm::input::too_many_parameters))]
    TooManyParameters { limit: usize },

    #[error("SGR mouse report needs 3 parameters, got {params:?}")]
    #[diagnostic(code(rawterm::input::malformed_mouse_report))]
    MalformedMouseReport { params: ParamList },

    #[error("unexpected parameters {params:?} for key sequence ending in {terminator:#04x}")]
    #[diagnostic(code(rawterm::input::unexpected_key_parameters))]
    UnexpectedKeyParameters { params: ParamList, terminator: u8 },

    #[error("modifier parameter {value} is outside 1..=8")]
    #[diagnostic(code(rawterm::input::invalid_modifier))]
    InvalidModifier { value: u16 },

    #[error("SGR mouse button code {code} is not supported")]
    #[diagnostic(
        code(rawterm::input::unsupported_mouse_button),
        help("Only left, middle, right, motion, and vertical wheel reports are decoded.")
    )]
    UnsupportedMouseButton { code: u16 },

    #[error("unknown key code {code} in `ESC [ {code} ~`")]
    #[diagnostic(code(rawterm::input::unknown_key_code))]
    UnknownKeyCode { code: u16 },

    #[error("invalid UTF-8 byte sequence {bytes:02x?}")]
    #[diagnostic(code(rawterm::input::invalid_utf8))]
    InvalidUtf8 { bytes: SmallVec<[u8; 4]> },
}

impl InputError {
    pub(crate) fn syscall(call: &'static str, source: io::Error) -> Self {
        Self::SyscallFailed { call, source }
    }

    /// `true` when the stream can keep going after this error.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        !matches!(self, InputError::SyscallFailed { .. })
    }

    /// The `errno` of a failed system call.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            InputError::SyscallFailed { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}
