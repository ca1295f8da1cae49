// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Byte-at-a-time decoder for VT-100 keyboard input and SGR mouse reports.
//!
//! The parser is a small state machine fed one byte at a time with
//! [`VtInputParser::advance()`]. Its state survives between calls, so a sequence split
//! across two `read()`s (an `ESC` at the end of one buffer and `x` at the start of the
//! next) decodes the same as if it arrived in one piece.
//!
//! ```text
//!             ESC                 [                  0-9 / <
//!  ┌────────┐ ──▶ ┌────────────┐ ──▶ ┌──────────────┐ ──▶ ┌────────────────┐
//!  │ Ground │     │ Escape     │     │ ControlSeq   │     │ NumericParams  │
//!  └────────┘ ◀── └────────────┘ ◀── └──────────────┘ ◀── └────────────────┘
//!      ▲   any other byte: Alt+key    A-D H F: key          A-D H F ~ M m: event
//!      │                 O                                  anything else: error
//!      │          ┌────────────┐
//!      ├───────── │ Ss3        │  P-S: F1-F4, A-D H F: keys, else Alt+O + replay
//!      │          └────────────┘
//!      │          ┌────────────┐
//!      └───────── │ Discard    │  0x40-0x7e: end of the broken sequence, ESC: replay
//!                 └────────────┘
//! ```
//!
//! # Grammar
//!
//! | Input                         | Event                                      |
//! | :---------------------------- | :----------------------------------------- |
//! | printable byte `b`            | `b`                                        |
//! | control byte `1..=31`         | `Ctrl` + `(b + 'a' - 1)`                   |
//! | byte `0`                      | per [`NulKeyPolicy`]                       |
//! | UTF-8 multi-byte sequence     | that character                             |
//! | `ESC x` (`x` not `[` or `O`)  | `Alt` + the key `x` decodes to             |
//! | `ESC [ A-D`                   | arrow keys                                 |
//! | `ESC [ H`, `ESC [ F`          | Home, End                                  |
//! | `ESC [ 1 ; m A-D/H/F`         | the same keys with modifiers `m`           |
//! | `ESC [ n ~`, `ESC [ n ; m ~`  | Insert, Delete, PageUp/Down, Home, End, Fn |
//! | `ESC O P-S`                   | F1-F4                                      |
//! | `ESC O A-D/H/F`               | arrows, Home, End (application mode)       |
//! | `ESC [ < b ; x ; y M/m`       | SGR mouse press (`M`) or release (`m`)     |
//!
//! Modifier parameter `m`: `m - 1` is a bit mask where bit 0 is `Shift`, bit 1 is
//! `Alt` and bit 2 is `Ctrl`, so `2` is `Shift`, `5` is `Ctrl` and `8` is all three.
//!
//! # Errors
//!
//! A sequence that breaks the grammar produces one [`InputError`] protocol violation and
//! no events for any of its bytes:
//!
//! - If the offending byte is a control sequence final byte (`0x40..=0x7e`), the
//!   sequence is over and the parser goes back to [`ParserState::Ground`].
//! - If it is a parameter or intermediate byte (`0x20..=0x3f`), as in the `ESC [ ? 1 ; 2 c`
//!   device attributes reply, the parser moves to [`ParserState::DiscardSequence`] and
//!   swallows the rest up to and including the final byte.
//! - An `ESC` always starts a new sequence, so it is replayed.
//!
//! At end of input, [`VtInputParser::finish()`] reports a sequence that was cut short.

use super::{Event, InputError, KeyCode, KeyEvent, KeyModifiers, MAX_PARAMS, MouseEvent,
            ParamList};
use smallvec::{SmallVec, smallvec};

const ESC: u8 = 0x1b;

/// How to decode the `NUL` byte (`Ctrl+Space` or `Ctrl+@` on most keyboards).
///
/// The `Ctrl + (b + 'a' - 1)` rule used for bytes `1..=31` turns `0` into `` Ctrl+` ``,
/// which is not what most keyboards send it for. The choice is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NulKeyPolicy {
    /// `` Ctrl+` ``, the same formula as the other control bytes.
    #[default]
    CtrlBacktick,
    /// `Ctrl+Space`.
    CtrlSpace,
    /// Drop the byte.
    Ignore,
}

/// Where the parser is inside a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParserState {
    /// Not inside any sequence.
    #[default]
    Ground,
    /// Saw `ESC`.
    Escape,
    /// Saw `ESC [`.
    ControlSequence,
    /// Saw `ESC [` followed by digits, `;` or `<` (SGR mouse).
    NumericParams { params: ParamList, sgr_mouse: bool },
    /// Saw `ESC O`.
    Ss3,
    /// Collecting the continuation bytes of a UTF-8 character.
    Utf8 { bytes: SmallVec<[u8; 4]>, expected_len: usize, alt: bool },
    /// Skipping the rest of a control sequence that was already reported as broken.
    DiscardSequence,
}

/// See the [module docs](self).
#[derive(Debug, Default)]
pub struct VtInputParser {
    state: ParserState,
    nul_key: NulKeyPolicy,
    replay: Option<u8>,
}

impl VtInputParser {
    #[must_use]
    pub fn new(nul_key: NulKeyPolicy) -> Self {
        Self { state: ParserState::Ground, nul_key, replay: None }
    }

    #[must_use]
    pub fn state(&self) -> &ParserState { &self.state }

    /// `true` when the parser holds a prefix (`ESC`, `ESC [` or `ESC O`) that a lone
    /// key press would also produce. See [`flush_pending()`](Self::flush_pending).
    #[must_use]
    pub fn has_pending_escape(&self) -> bool {
        matches!(
            self.state,
            ParserState::Escape | ParserState::ControlSequence | ParserState::Ss3
        )
    }

    /// A byte that was looked at but not consumed. It must be fed to
    /// [`advance()`](Self::advance) again before any new input.
    pub fn take_replay(&mut self) -> Option<u8> { self.replay.take() }

    /// Gives up waiting for the rest of an escape prefix and decodes what is there:
    /// `ESC` is the Escape key, `ESC [` is `Alt+[` and `ESC O` is `Alt+O`. Other states
    /// are left alone.
    pub fn flush_pending(&mut self) -> Option<Event> {
        let key = match self.state {
            ParserState::Escape => KeyEvent::new(KeyCode::Escape, KeyModifiers::empty()),
            ParserState::ControlSequence => {
                KeyEvent::new(KeyCode::Char('['), KeyModifiers::ALT)
            }
            ParserState::Ss3 => KeyEvent::new(KeyCode::Char('O'), KeyModifiers::ALT),
            _ => return None,
        };
        self.state = ParserState::Ground;
        Some(key.into())
    }

    /// Input ended. Decodes a pending escape prefix like [`flush_pending()`] does, and
    /// reports a control sequence or UTF-8 character that was cut short. The parser is
    /// back in [`ParserState::Ground`] afterwards.
    ///
    /// [`flush_pending()`]: Self::flush_pending
    pub fn finish(&mut self) -> Option<Result<Event, InputError>> {
        if let Some(event) = self.flush_pending() {
            return Some(Ok(event));
        }
        match std::mem::take(&mut self.state) {
            ParserState::NumericParams { params, .. } => {
                Some(Err(InputError::TruncatedNumericSequence { params }))
            }
            ParserState::Utf8 { bytes, .. } => Some(Err(InputError::InvalidUtf8 { bytes })),
            _ => None,
        }
    }

    /// Forgets any partial sequence and pending replay.
    pub fn reset(&mut self) {
        self.state = ParserState::Ground;
        self.replay = None;
    }

    /// Feeds one byte. Returns an event or a protocol violation when the byte
    /// completes (or breaks) a sequence, and [`None`] while a sequence is still open.
    pub fn advance(&mut self, byte: u8) -> Option<Result<Event, InputError>> {
        let state = std::mem::take(&mut self.state);
        let result = match state {
            ParserState::Ground => self.on_ground(byte),
            ParserState::Escape => self.on_escape(byte),
            ParserState::ControlSequence => self.on_control_sequence(byte),
            ParserState::NumericParams { params, sgr_mouse } => {
                self.on_numeric(params, sgr_mouse, byte)
            }
            ParserState::Ss3 => self.on_ss3(byte),
            ParserState::Utf8 { bytes, expected_len, alt } => {
                self.on_utf8(bytes, expected_len, alt, byte)
            }
            ParserState::DiscardSequence => {
                self.on_discard(byte);
                None
            }
        };
        result
    }

    /// Decodes a complete buffer, replaying bytes as needed. Partial sequences at the
    /// end stay in the parser for the next call.
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Vec<Result<Event, InputError>> {
        let mut results = vec![];
        for &byte in bytes {
            let mut next = Some(byte);
            while let Some(byte) = next {
                results.extend(self.advance(byte));
                next = self.take_replay();
            }
        }
        results
    }

    fn on_ground(&mut self, byte: u8) -> Option<Result<Event, InputError>> {
        match byte {
            ESC => {
                self.state = ParserState::Escape;
                None
            }
            0x80..=0xff => self.start_utf8(byte, false),
            _ => self.single_byte_key(byte, KeyModifiers::empty()).map(Ok),
        }
    }

    fn on_escape(&mut self, byte: u8) -> Option<Result<Event, InputError>> {
        match byte {
            b'[' => {
                self.state = ParserState::ControlSequence;
                None
            }
            b'O' => {
                self.state = ParserState::Ss3;
                None
            }
            ESC => Some(Ok(KeyEvent::new(KeyCode::Escape, KeyModifiers::ALT).into())),
            0x80..=0xff => self.start_utf8(byte, true),
            _ => self.single_byte_key(byte, KeyModifiers::ALT).map(Ok),
        }
    }

    fn on_control_sequence(&mut self, byte: u8) -> Option<Result<Event, InputError>> {
        match byte {
            b'0'..=b'9' => {
                self.state = ParserState::NumericParams {
                    params: smallvec![u16::from(byte - b'0')],
                    sgr_mouse: false,
                };
                None
            }
            b'<' => {
                self.state = ParserState::NumericParams {
                    params: smallvec![0],
                    sgr_mouse: true,
                };
                None
            }
            _ => match cursor_key(byte) {
                Some(code) => Some(Ok(KeyEvent::new(code, KeyModifiers::empty()).into())),
                None => {
                    self.abandon_sequence(byte);
                    Some(Err(InputError::InvalidSequenceStart { byte }))
                }
            },
        }
    }

    fn on_numeric(
        &mut self,
        mut params: ParamList,
        sgr_mouse: bool,
        byte: u8,
    ) -> Option<Result<Event, InputError>> {
        match byte {
            b'0'..=b'9' => {
                if let Some(last) = params.last_mut() {
                    *last = last.saturating_mul(10).saturating_add(u16::from(byte - b'0'));
                }
                self.state = ParserState::NumericParams { params, sgr_mouse };
                None
            }
            b';' => {
                if params.len() == MAX_PARAMS {
                    self.abandon_sequence(byte);
                    return Some(Err(InputError::TooManyParameters { limit: MAX_PARAMS }));
                }
                params.push(0);
                self.state = ParserState::NumericParams { params, sgr_mouse };
                None
            }
            b'M' | b'm' if sgr_mouse => Some(decode_sgr_mouse(&params, byte == b'm')),
            b'~' if !sgr_mouse => Some(decode_tilde_key(&params)),
            _ if !sgr_mouse && cursor_key(byte).is_some() => {
                Some(decode_modified_cursor_key(params, byte))
            }
            _ => {
                self.abandon_sequence(byte);
                Some(Err(InputError::UnfinishedNumericSequence {
                    params,
                    terminator: byte,
                }))
            }
        }
    }

    /// Called with the byte that broke a control sequence.
    fn abandon_sequence(&mut self, byte: u8) {
        match byte {
            ESC => self.replay = Some(byte),
            0x20..=0x3f => self.state = ParserState::DiscardSequence,
            _ => {}
        }
    }

    fn on_discard(&mut self, byte: u8) {
        match byte {
            ESC => self.replay = Some(byte),
            0x40..=0x7e => {}
            _ => self.state = ParserState::DiscardSequence,
        }
    }

    fn on_ss3(&mut self, byte: u8) -> Option<Result<Event, InputError>> {
        let code = match byte {
            b'P'..=b'S' => Some(KeyCode::Function(byte - b'P' + 1)),
            _ => cursor_key(byte),
        };
        match code {
            Some(code) => Some(Ok(KeyEvent::new(code, KeyModifiers::empty()).into())),
            None => {
                self.replay = Some(byte);
                Some(Ok(KeyEvent::new(KeyCode::Char('O'), KeyModifiers::ALT).into()))
            }
        }
    }

    fn start_utf8(&mut self, lead: u8, alt: bool) -> Option<Result<Event, InputError>> {
        let expected_len = match lead {
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => {
                return Some(Err(InputError::InvalidUtf8 { bytes: smallvec![lead] }));
            }
        };
        self.state = ParserState::Utf8 { bytes: smallvec![lead], expected_len, alt };
        None
    }

    fn on_utf8(
        &mut self,
        mut bytes: SmallVec<[u8; 4]>,
        expected_len: usize,
        alt: bool,
        byte: u8,
    ) -> Option<Result<Event, InputError>> {
        if !(0x80..=0xbf).contains(&byte) {
            // The byte starts something new; decode it after reporting.
            self.replay = Some(byte);
            return Some(Err(InputError::InvalidUtf8 { bytes }));
        }
        bytes.push(byte);
        if bytes.len() < expected_len {
            self.state = ParserState::Utf8 { bytes, expected_len, alt };
            return None;
        }
        let decoded = std::str::from_utf8(&bytes)
            .ok()
            .and_then(|it| it.chars().next());
        Some(match decoded {
            Some(ch) => {
                let modifiers = if alt { KeyModifiers::ALT } else { KeyModifiers::empty() };
                Ok(KeyEvent::new(KeyCode::Char(ch), modifiers).into())
            }
            None => Err(InputError::InvalidUtf8 { bytes }),
        })
    }

    /// A byte outside any sequence (or right after `ESC`, with `Alt`).
    fn single_byte_key(&self, byte: u8, modifiers: KeyModifiers) -> Option<Event> {
        let key = match byte {
            0 => match self.nul_key {
                NulKeyPolicy::CtrlBacktick => {
                    KeyEvent::new(KeyCode::Char('`'), modifiers | KeyModifiers::CTRL)
                }
                NulKeyPolicy::CtrlSpace => {
                    KeyEvent::new(KeyCode::Char(' '), modifiers | KeyModifiers::CTRL)
                }
                NulKeyPolicy::Ignore => return None,
            },
            1..=31 => KeyEvent::new(
                KeyCode::Char(char::from(byte + b'a' - 1)),
                modifiers | KeyModifiers::CTRL,
            ),
            _ => KeyEvent::new(KeyCode::Char(char::from(byte)), modifiers),
        };
        Some(key.into())
    }
}

/// Final bytes shared by `ESC [`, `ESC [ 1 ; m` and `ESC O`.
fn cursor_key(byte: u8) -> Option<KeyCode> {
    match byte {
        b'A' => Some(KeyCode::Up),
        b'B' => Some(KeyCode::Down),
        b'C' => Some(KeyCode::Right),
        b'D' => Some(KeyCode::Left),
        b'H' => Some(KeyCode::Home),
        b'F' => Some(KeyCode::End),
        _ => None,
    }
}

/// Decodes the xterm modifier parameter: `1` is none, `2..=8` encode `m - 1` as a
/// `Shift` / `Alt` / `Ctrl` bit mask.
fn decode_modifiers(value: u16) -> Result<KeyModifiers, InputError> {
    if !(1..=8).contains(&value) {
        return Err(InputError::InvalidModifier { value });
    }
    let bits = value - 1;
    let mut modifiers = KeyModifiers::empty();
    modifiers.set(KeyModifiers::SHIFT, bits & 1 != 0);
    modifiers.set(KeyModifiers::ALT, bits & 2 != 0);
    modifiers.set(KeyModifiers::CTRL, bits & 4 != 0);
    Ok(modifiers)
}

/// `ESC [ 1 ; m A-D/H/F`.
fn decode_modified_cursor_key(params: ParamList, terminator: u8) -> Result<Event, InputError> {
    let code_and_modifier = match (cursor_key(terminator), params.as_slice()) {
        (Some(code), &[1, modifier]) => Some((code, modifier)),
        _ => None,
    };
    let Some((code, modifier)) = code_and_modifier else {
        return Err(InputError::UnexpectedKeyParameters { params, terminator });
    };
    Ok(KeyEvent::new(code, decode_modifiers(modifier)?).into())
}

/// `ESC [ n ~` and `ESC [ n ; m ~`.
#[allow(clippy::cast_possible_truncation)]
fn decode_tilde_key(params: &ParamList) -> Result<Event, InputError> {
    let (code_param, modifiers) = match params.as_slice() {
        [code] => (*code, KeyModifiers::empty()),
        [code, modifier] => (*code, decode_modifiers(*modifier)?),
        _ => {
            return Err(InputError::UnexpectedKeyParameters {
                params: params.clone(),
                terminator: b'~',
            });
        }
    };
    let code = match code_param {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        11..=15 => KeyCode::Function((code_param - 10) as u8),
        17..=21 => KeyCode::Function((code_param - 11) as u8),
        23 | 24 => KeyCode::Function((code_param - 12) as u8),
        _ => return Err(InputError::UnknownKeyCode { code: code_param }),
    };
    Ok(KeyEvent::new(code, modifiers).into())
}

/// `ESC [ < b ; x ; y M/m`.
fn decode_sgr_mouse(params: &ParamList, released: bool) -> Result<Event, InputError> {
    let &[button_code, x, y] = params.as_slice() else {
        return Err(InputError::MalformedMouseReport { params: params.clone() });
    };
    u8::try_from(button_code)
        .ok()
        .and_then(|code| MouseEvent::from_sgr(code, x, y, released))
        .map(Event::from)
        .ok_or(InputError::UnsupportedMouseButton { code: button_code })
}




#[cfg(test)]
mod tests_mouse {
    use super::{test_fixtures::*, *};
    use crate::{MouseButton, MouseModifiers};
    use pretty_assertions::assert_eq;

    #[test]
    fn left_press_and_release() {
        let events = parse_events(b"\x1b[<0;10;5M\x1b[<0;10;5m");
        let press = events[0].mouse().unwrap();
        let release = events[1].mouse().unwrap();

        assert_eq!(press.button(), MouseButton::Left);
        assert_eq!((press.x(), press.y()), (10, 5));
        assert!(!press.is_release());

        assert_eq!(release.button(), MouseButton::Left);
        assert_eq!((release.x(), release.y()), (10, 5));
        assert!(release.is_release());
        assert!(release.modifiers().contains(MouseModifiers::RELEASE));
    }

    #[test]
    fn wheel_and_modifiers() {
        let events = parse_events(b"\x1b[<64;1;1M\x1b[<65;1;1M\x1b[<18;3;4M");
        assert_eq!(events[0].mouse().unwrap().button(), MouseButton::WheelUp);
        assert_eq!(events[1].mouse().unwrap().button(), MouseButton::WheelDown);
        let ctrl_right = events[2].mouse().unwrap();
        assert_eq!(ctrl_right.button(), MouseButton::Right);
        assert_eq!(ctrl_right.modifiers(), MouseModifiers::CTRL);
    }

    #[test]
    fn motion() {
        let events = parse_events(b"\x1b[<35;20;7M\x1b[<32;21;7M");
        let hover = events[0].mouse().unwrap();
        assert_eq!(hover.button(), MouseButton::Move);
        assert!(hover.is_motion());
        let drag = events[1].mouse().unwrap();
        assert_eq!(drag.button(), MouseButton::Left);
        assert!(drag.is_motion());
    }

    #[test]
    fn large_coordinates() {
        let events = parse_events(b"\x1b[<0;300;200M");
        let mouse = events[0].mouse().unwrap();
        assert_eq!((mouse.x(), mouse.y()), (300, 200));
    }

    #[test]
    fn wrong_parameter_count() {
        assert!(matches!(
            parse(b"\x1b[<0;10M").as_slice(),
            [Err(InputError::MalformedMouseReport { .. })]
        ));
    }

    #[test]
    fn unsupported_button() {
        assert!(matches!(
            parse(b"\x1b[<66;1;1M").as_slice(),
            [Err(InputError::UnsupportedMouseButton { code: 66 })]
        ));
    }

    #[test]
    fn mouse_terminator_without_sgr_marker() {
        assert!(matches!(
            parse(b"\x1b[0;1;1M").as_slice(),
            [Err(InputError::UnfinishedNumericSequence { terminator: b'M', .. })]
        ));
    }
}


#[cfg(test)]
mod tests_chunked_input {
    use super::{test_fixtures::*, *};
    use pretty_assertions::assert_eq;

    #[test]
    fn escape_split_across_reads() {
        let mut parser = VtInputParser::default();
        assert!(parser.parse_bytes(b"\x1b").is_empty());
        assert!(parser.has_pending_escape());
        let events: Vec<_> = parser
            .parse_bytes(b"x")
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(events, vec![key(KeyCode::Char('x'), KeyModifiers::ALT)]);
    }

    #[test]
    fn mouse_report_split_byte_by_byte() {
        let mut parser = VtInputParser::default();
        let mut events = vec![];
        for byte in b"\x1b[<2;40;12M" {
            events.extend(parser.parse_bytes(&[*byte]));
        }
        assert_eq!(events.len(), 1);
        let mouse = events[0].as_ref().unwrap().mouse().unwrap();
        assert_eq!((mouse.x(), mouse.y()), (40, 12));
    }

    #[test]
    fn utf8_split_across_reads() {
        let bytes = "中".as_bytes();
        let mut parser = VtInputParser::default();
        assert!(parser.parse_bytes(&bytes[..1]).is_empty());
        assert!(parser.parse_bytes(&bytes[1..2]).is_empty());
        let events = parser.parse_bytes(&bytes[2..]);
        assert_eq!(events[0].as_ref().ok(), Some(&ch('中')));
    }

    #[test]
    fn flush_pending_prefixes() {
        let mut parser = VtInputParser::default();
        parser.parse_bytes(b"\x1b");
        assert_eq!(
            parser.flush_pending(),
            Some(key(KeyCode::Escape, KeyModifiers::empty()))
        );
        assert_eq!(parser.state(), &ParserState::Ground);

        parser.parse_bytes(b"\x1b[");
        assert_eq!(
            parser.flush_pending(),
            Some(key(KeyCode::Char('['), KeyModifiers::ALT))
        );

        parser.parse_bytes(b"\x1b[1");
        assert_eq!(parser.flush_pending(), None);
    }

    #[test]
    fn finish_reports_truncated_sequences() {
        let mut parser = VtInputParser::default();
        assert!(parser.parse_bytes(b"\x1b[1;").is_empty());
        match parser.finish() {
            Some(Err(InputError::TruncatedNumericSequence { params })) => {
                assert_eq!(params.as_slice(), &[1, 0]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(parser.state(), &ParserState::Ground);

        assert!(parser.parse_bytes(&"中".as_bytes()[..2]).is_empty());
        assert!(matches!(parser.finish(), Some(Err(InputError::InvalidUtf8 { .. }))));

        parser.parse_bytes(b"\x1b");
        assert_eq!(
            parser.finish().unwrap().unwrap(),
            key(KeyCode::Escape, KeyModifiers::empty())
        );

        // Already reported when it broke.
        parser.parse_bytes(b"\x1b[?1");
        assert!(parser.finish().is_none());
        assert!(parser.finish().is_none());
    }
}
