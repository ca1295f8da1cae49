// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{ByteReader, InputSource, Pulled, ReadTimeout};
use crate::{Event, InputError, SessionConfig, VtInputParser};
use std::time::Duration;

/// Decoded terminal input.
///
/// Bytes come from a [`ByteReader`] and go through a [`VtInputParser`] whose state
/// outlives each read, so sequences split across reads decode correctly.
///
/// - [`pull()`](Self::pull) waits at most the configured [`ReadTimeout`] and can be
///   called in a cooperative loop.
/// - The [`Iterator`] impl waits through timeouts. It yields protocol violations as
///   `Some(Err(..))` and keeps going, and ends after end of input or a fatal error.
///
/// # Escape key
///
/// `ESC` is also the first byte of every escape sequence. With
/// [`SessionConfig::esc_timeout`] set, a pending `ESC` (or `ESC [`, `ESC O`) with no
/// follow-up byte within that time is decoded on its own, see
/// [`VtInputParser::flush_pending()`]. Without it, the parser waits for the next byte.
#[derive(Debug)]
pub struct EventStream<S> {
    reader: ByteReader<S>,
    parser: VtInputParser,
    timeout: ReadTimeout,
    esc_timeout: Option<Duration>,
}

impl<S: InputSource> EventStream<S> {
    #[must_use]
    pub fn new(source: S, config: &SessionConfig) -> Self {
        Self {
            reader: ByteReader::new(source, config.read_buffer_size),
            parser: VtInputParser::new(config.nul_key),
            timeout: config.read_timeout,
            esc_timeout: config.esc_timeout,
        }
    }

    #[must_use]
    pub fn parser(&self) -> &VtInputParser { &self.parser }

    /// Pulls bytes until one event is decoded, the wait times out, or input ends.
    ///
    /// # Errors
    ///
    /// - A protocol violation: the bad sequence was dropped, pull again to continue.
    ///   Input that ends in the middle of a sequence is reported this way too, and the
    ///   next pull returns [`Pulled::Closed`].
    /// - [`InputError::SyscallFailed`]: the stream is closed.
    pub fn pull(&mut self) -> Result<Pulled<Event>, InputError> {
        loop {
            let byte = match self.parser.take_replay() {
                Some(byte) => byte,
                None => {
                    let escape_deadline = self
                        .esc_timeout
                        .filter(|_| self.parser.has_pending_escape());
                    let timeout = escape_deadline.map_or(self.timeout, ReadTimeout::After);

                    let pulled = match self.reader.next_byte(timeout) {
                        Ok(pulled) => pulled,
                        Err(error) => {
                            self.parser.reset();
                            return Err(error);
                        }
                    };
                    match pulled {
                        Pulled::Ready(byte) => byte,
                        Pulled::TimedOut if escape_deadline.is_none() => {
                            return Ok(Pulled::TimedOut);
                        }
                        // Nothing followed the escape prefix: it was a key press.
                        Pulled::TimedOut => {
                            return Ok(self
                                .parser
                                .flush_pending()
                                .map_or(Pulled::TimedOut, Pulled::Ready));
                        }
                        // A sequence cut short is reported before the stream ends.
                        Pulled::Closed => {
                            return match self.parser.finish() {
                                None => Ok(Pulled::Closed),
                                Some(Ok(event)) => Ok(Pulled::Ready(event)),
                                Some(Err(error)) => Err(error),
                            };
                        }
                    }
                }
            };

            match self.parser.advance(byte) {
                None => {}
                Some(Ok(event)) => return Ok(Pulled::Ready(event)),
                Some(Err(error)) => {
                    tracing::debug!(
                        message = "EventStream: dropped malformed sequence",
                        error = %error
                    );
                    return Err(error);
                }
            }
        }
    }
}

impl<S: InputSource> Iterator for EventStream<S> {
    type Item = Result<Event, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.pull() {
                Ok(Pulled::Ready(event)) => return Some(Ok(event)),
                Ok(Pulled::TimedOut) => {}
                Ok(Pulled::Closed) => return None,
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyCode, KeyEvent, KeyModifiers, MouseButton,
                test_fixtures::{ScriptStep, ScriptedSource}};
    use pretty_assertions::assert_eq;
    use std::io;

    fn alt(ch: char) -> Event { KeyEvent::new(KeyCode::Char(ch), KeyModifiers::ALT).into() }

    #[test]
    fn escape_split_across_reads_is_alt() {
        let source = ScriptedSource::from_chunks([b"\x1b".as_slice(), b"x"]);
        let events: Vec<_> = EventStream::new(source, &SessionConfig::default())
            .map(Result::unwrap)
            .collect();
        assert_eq!(events, vec![alt('x')]);
    }

    #[test]
    fn mouse_report_split_across_reads() {
        let source = ScriptedSource::from_chunks([
            b"\x1b[<0;1".as_slice(),
            b"0;5",
            b"m",
        ]);
        let events: Vec<_> = EventStream::new(source, &SessionConfig::default())
            .map(Result::unwrap)
            .collect();
        let mouse = events[0].mouse().unwrap();
        assert_eq!(mouse.button(), MouseButton::Left);
        assert!(mouse.is_release());
        assert_eq!((mouse.x(), mouse.y()), (10, 5));
    }

    #[test]
    fn protocol_violation_does_not_end_stream() {
        let source = ScriptedSource::from_chunks([b"\x1b[?1;2cq".as_slice()]);
        let mut stream = EventStream::new(source, &SessionConfig::default());
        assert!(stream.next().unwrap().unwrap_err().is_protocol_violation());
        assert_eq!(stream.next().unwrap().unwrap(), KeyEvent::plain('q').into());
        assert!(stream.next().is_none());
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let source = ScriptedSource::new([
            ScriptStep::WaitError(io::ErrorKind::Interrupted),
            ScriptStep::ReadError(io::ErrorKind::WouldBlock),
            ScriptStep::Chunk(b"\x1b[1;5C".to_vec()),
        ]);
        let events: Vec<_> = EventStream::new(source, &SessionConfig::default())
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            events,
            vec![KeyEvent::new(KeyCode::Right, KeyModifiers::CTRL).into()]
        );
    }

    #[test]
    fn fatal_error_is_reported_once_then_stream_ends() {
        let source = ScriptedSource::new([
            ScriptStep::Chunk(b"a".to_vec()),
            ScriptStep::ReadRawOsError(5),
        ]);
        let mut stream = EventStream::new(source, &SessionConfig::default());
        assert_eq!(stream.next().unwrap().unwrap(), KeyEvent::plain('a').into());
        let error = stream.next().unwrap().unwrap_err();
        assert!(!error.is_protocol_violation());
        assert_eq!(error.raw_os_error(), Some(5));
        assert!(stream.next().is_none());
    }

    #[test]
    fn zero_timeout_returns_control() {
        let source = ScriptedSource::new([
            ScriptStep::Timeout,
            ScriptStep::Chunk(b"k".to_vec()),
        ]);
        let config = SessionConfig::default().with_read_timeout(ReadTimeout::Immediate);
        let mut stream = EventStream::new(source, &config);
        assert_eq!(stream.pull().unwrap(), Pulled::TimedOut);
        assert_eq!(stream.pull().unwrap(), Pulled::Ready(KeyEvent::plain('k').into()));
        assert_eq!(stream.pull().unwrap(), Pulled::Closed);
    }

    #[test]
    fn esc_timeout_emits_escape_key() {
        let source = ScriptedSource::new([
            ScriptStep::Chunk(b"\x1b".to_vec()),
            ScriptStep::Timeout,
            ScriptStep::Chunk(b"x".to_vec()),
        ]);
        let config =
            SessionConfig::default().with_esc_timeout(Some(Duration::from_millis(20)));
        let events: Vec<_> = EventStream::new(source, &config)
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            events,
            vec![
                KeyEvent::new(KeyCode::Escape, KeyModifiers::empty()).into(),
                KeyEvent::plain('x').into(),
            ]
        );
    }

    #[test]
    fn truncated_sequences_at_end_of_input_are_reported() {
        let source = ScriptedSource::from_chunks([b"a".as_slice(), b"\x1b[1;"]);
        let mut stream = EventStream::new(source, &SessionConfig::default());
        assert_eq!(stream.next().unwrap().unwrap(), KeyEvent::plain('a').into());
        assert!(matches!(
            stream.next().unwrap().unwrap_err(),
            InputError::TruncatedNumericSequence { .. }
        ));
        assert!(stream.next().is_none());

        let source = ScriptedSource::from_chunks([&"é".as_bytes()[..1]]);
        let mut stream = EventStream::new(source, &SessionConfig::default());
        let error = stream.next().unwrap().unwrap_err();
        assert!(matches!(error, InputError::InvalidUtf8 { .. }));
        assert!(error.is_protocol_violation());
        assert!(stream.next().is_none());
    }

    #[test]
    fn fatal_error_inside_sequence_ends_stream_without_more_errors() {
        let source = ScriptedSource::new([
            ScriptStep::Chunk(b"\x1b[<0;1".to_vec()),
            ScriptStep::ReadRawOsError(5),
        ]);
        let mut stream = EventStream::new(source, &SessionConfig::default());
        assert!(!stream.next().unwrap().unwrap_err().is_protocol_violation());
        assert!(stream.next().is_none());
    }

    #[test]
    fn lone_escape_at_end_of_input() {
        let source = ScriptedSource::from_chunks([b"a\x1b".as_slice()]);
        let events: Vec<_> = EventStream::new(source, &SessionConfig::default())
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            events,
            vec![
                KeyEvent::plain('a').into(),
                KeyEvent::new(KeyCode::Escape, KeyModifiers::empty()).into(),
            ]
        );
    }
}
