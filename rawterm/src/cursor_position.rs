// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words DSR

//! Ask the terminal where the cursor is with a Device Status Report (`ESC [ 6 n`) and
//! read back the Cursor Position Report (`ESC [ row ; col R`).
//!
//! Any failure (write error, read error, end of input, timeout, malformed reply)
//! produces [`CursorPosition::INVALID`] rather than an error, so callers can use the
//! result directly as a best-effort hint.

use crate::{InputSource, ReadTimeout};
use std::{io::{self, Write},
          time::{Duration, Instant}};

/// Device Status Report: "report cursor position".
pub const CURSOR_POSITION_REQUEST: &[u8] = b"\x1b[6n";

/// A 1-based cursor position as the terminal reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorPosition {
    pub col: u16,
    pub row: u16,
}

impl CursorPosition {
    pub const INVALID: Self = Self { col: u16::MAX, row: u16::MAX };

    #[must_use]
    pub fn is_valid(&self) -> bool { *self != Self::INVALID }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplyState {
    BeforeEscape,
    AfterEscape,
    AfterBracket,
    Row(u16),
    Col { row: u16, col: Option<u16> },
}

enum Step {
    Continue(ReplyState),
    Done(CursorPosition),
    Malformed,
}

impl ReplyState {
    fn advance(self, byte: u8) -> Step {
        match (self, byte) {
            // Whatever the user typed before the reply is skipped.
            (ReplyState::BeforeEscape, 0x1b) => Step::Continue(ReplyState::AfterEscape),
            (ReplyState::BeforeEscape, _) => Step::Continue(ReplyState::BeforeEscape),
            (ReplyState::AfterEscape, b'[') => Step::Continue(ReplyState::AfterBracket),
            (ReplyState::AfterBracket, b'0'..=b'9') => {
                Step::Continue(ReplyState::Row(u16::from(byte - b'0')))
            }
            (ReplyState::Row(row), b'0'..=b'9') => match push_digit(row, byte) {
                Some(row) => Step::Continue(ReplyState::Row(row)),
                None => Step::Malformed,
            },
            (ReplyState::Row(row), b';') => {
                Step::Continue(ReplyState::Col { row, col: None })
            }
            (ReplyState::Col { row, col }, b'0'..=b'9') => {
                match push_digit(col.unwrap_or(0), byte) {
                    Some(col) => Step::Continue(ReplyState::Col { row, col: Some(col) }),
                    None => Step::Malformed,
                }
            }
            (ReplyState::Col { row, col: Some(col) }, b'R') => {
                Step::Done(CursorPosition { col, row })
            }
            _ => Step::Malformed,
        }
    }
}

fn push_digit(value: u16, digit: u8) -> Option<u16> {
    value.checked_mul(10)?.checked_add(u16::from(digit - b'0'))
}

/// Writes [`CURSOR_POSITION_REQUEST`] to `output` and reads the reply from `input`
/// one byte at a time. `timeout` bounds the whole exchange; [`None`] waits forever.
///
/// Must run while the terminal is in raw or cbreak mode, otherwise the reply is held
/// back by the line discipline (and echoed).
pub fn query_cursor_position(
    input: &mut impl InputSource,
    output: &mut impl Write,
    timeout: Option<Duration>,
) -> CursorPosition {
    if let Err(error) = output
        .write_all(CURSOR_POSITION_REQUEST)
        .and_then(|()| output.flush())
    {
        tracing::debug!(message = "cursor position request not written", error = ?error);
        return CursorPosition::INVALID;
    }

    let deadline = timeout.map(|it| Instant::now() + it);
    let mut state = ReplyState::BeforeEscape;
    loop {
        let Some(byte) = read_one_byte(input, deadline) else {
            return CursorPosition::INVALID;
        };
        match state.advance(byte) {
            Step::Continue(next) => state = next,
            Step::Done(position) => return position,
            Step::Malformed => {
                tracing::debug!(
                    message = "malformed cursor position report",
                    state = ?state,
                    byte
                );
                return CursorPosition::INVALID;
            }
        }
    }
}

/// [`None`] on timeout, end of input, or a read error.
fn read_one_byte(input: &mut impl InputSource, deadline: Option<Instant>) -> Option<u8> {
    let mut byte = [0_u8; 1];
    loop {
        let wait = match deadline {
            None => ReadTimeout::Forever,
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    ReadTimeout::Immediate
                } else {
                    ReadTimeout::After(remaining)
                }
            }
        };
        match input.wait_readable(wait) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(message = "cursor position report timed out");
                return None;
            }
            Err(error) if is_transient(&error) => continue,
            Err(error) => {
                tracing::debug!(message = "cursor position wait failed", error = ?error);
                return None;
            }
        }
        match input.read(&mut byte) {
            Ok(0) => return None,
            Ok(_) => return Some(byte[0]),
            Err(error) if is_transient(&error) => {}
            Err(error) => {
                tracing::debug!(message = "cursor position read failed", error = ?error);
                return None;
            }
        }
    }
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{ScriptStep, ScriptedSource};
    use pretty_assertions::assert_eq;

    fn query(source: &mut ScriptedSource) -> (CursorPosition, Vec<u8>) {
        let mut written = vec![];
        let position =
            query_cursor_position(source, &mut written, Some(Duration::from_secs(1)));
        (position, written)
    }

    #[test]
    fn writes_request_and_parses_reply() {
        let mut source = ScriptedSource::from_chunks([b"\x1b[12;40R".as_slice()]);
        let (position, written) = query(&mut source);
        assert_eq!(written, CURSOR_POSITION_REQUEST);
        assert_eq!(position, CursorPosition { col: 40, row: 12 });
        assert!(position.is_valid());
    }

    #[test]
    fn reply_split_across_reads_after_typed_bytes() {
        let mut source = ScriptedSource::new([
            ScriptStep::Chunk(b"abc\x1b".to_vec()),
            ScriptStep::ReadError(io::ErrorKind::Interrupted),
            ScriptStep::Chunk(b"[3".to_vec()),
            ScriptStep::Chunk(b";7R".to_vec()),
        ]);
        assert_eq!(query(&mut source).0, CursorPosition { col: 7, row: 3 });
    }

    #[test]
    fn end_of_input_is_invalid() {
        let mut source = ScriptedSource::from_chunks([b"\x1b[12".as_slice()]);
        assert_eq!(query(&mut source).0, CursorPosition::INVALID);
    }

    #[test]
    fn timeout_is_invalid() {
        let mut source = ScriptedSource::new([ScriptStep::Timeout]);
        assert_eq!(query(&mut source).0, CursorPosition::INVALID);
    }

    #[test]
    fn malformed_replies_are_invalid() {
        for reply in [
            b"\x1b]12;40R".as_slice(),
            b"\x1b[;40R",
            b"\x1b[12;R",
            b"\x1b[12;40H",
            b"\x1b[99999;1R",
        ] {
            let mut source = ScriptedSource::from_chunks([reply]);
            assert_eq!(
                query(&mut source).0,
                CursorPosition::INVALID,
                "{}",
                String::from_utf8_lossy(reply)
            );
        }
    }

    #[test]
    fn write_failure_is_invalid() {
        struct BrokenPipe;
        impl Write for BrokenPipe {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> io::Result<()> { Ok(()) }
        }
        let mut source = ScriptedSource::from_chunks([b"\x1b[1;1R".as_slice()]);
        let position = query_cursor_position(&mut source, &mut BrokenPipe, None);
        assert_eq!(position, CursorPosition::INVALID);
    }
}
