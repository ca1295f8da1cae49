// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Decoded input events.
//!
//! An [`Event`] is either a [`KeyEvent`] or a [`MouseEvent`], packed into a single
//! [`u64`] so it can be copied, hashed and compared as a plain value. The top bit of the
//! last byte ([`KEY_MARKER`]) tells the two apart. The modifier bits for `Shift`, `Alt`
//! and `Ctrl` sit at the same positions for both variants, so
//! [`Event::alt_pressed()`] and friends work without unpacking.
//!
//! ```text
//! bit   63      62..56          55..32          31..0
//! key   1       modifiers       0               code point or special key id
//! mouse 0       folded code     release flag    y (31..16) x (15..0)
//! ```

use bitflags::bitflags;
use std::fmt::{self, Debug, Display, Formatter};
use strum_macros::Display as StrumDisplay;

/// Set in the modifier byte of every key [`Event`]. Clear for mouse events.
pub const KEY_MARKER: u8 = 0b1000_0000;

bitflags! {
    /// Modifiers attached to a [`KeyEvent`].
    ///
    /// [`SPECIAL`] marks the code as a symbolic key (arrow, function key) rather than
    /// a literal character. [`KeyEvent::new()`] keeps it in sync with the [`KeyCode`].
    ///
    /// [`SPECIAL`]: KeyModifiers::SPECIAL
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 4;
        const ALT = 8;
        const CTRL = 16;
        const SPECIAL = 64;
    }
}

bitflags! {
    /// Modifiers attached to a [`MouseEvent`].
    ///
    /// [`RELEASE`] shares its bit with the SGR motion flag. The release marker of an SGR
    /// report (`m` terminator) is folded into the stored code with an XOR, and
    /// [`MouseEvent::button()`] undoes the fold.
    ///
    /// [`RELEASE`]: MouseModifiers::RELEASE
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseModifiers: u8 {
        const SHIFT = 4;
        const ALT = 8;
        const CTRL = 16;
        const RELEASE = 32;
    }
}

/// Bits of an SGR button code that carry keyboard modifiers.
const SGR_MODIFIER_MASK: u8 = 4 | 8 | 16;
/// SGR button code flag for motion reports (same bit as [`MouseModifiers::RELEASE`]).
pub const SGR_MOTION_FLAG: u8 = 32;
/// SGR button code flag for wheel reports.
const SGR_WHEEL_FLAG: u8 = 64;

// ╭────────────────────────────────────────────────────────────────╮
// │ Keys                                                           │
// ╰────────────────────────────────────────────────────────────────╯

/// What was pressed: a literal character or a symbolic key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Up,
    Down,
    Right,
    Left,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    Escape,
    Function(u8),
}

impl Display for KeyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(ch) if ch.is_control() => write!(f, "{ch:?}"),
            KeyCode::Char(ch) => write!(f, "{ch}"),
            KeyCode::Function(number) => write!(f, "F{number}"),
            other => Debug::fmt(other, f),
        }
    }
}

/// Packed ids for the symbolic keys. Function keys start at [`FUNCTION_KEY_BASE`].
const FUNCTION_KEY_BASE: u32 = 0x100;

impl KeyCode {
    #[must_use]
    pub fn is_special(&self) -> bool { !matches!(self, KeyCode::Char(_)) }

    fn to_packed(self) -> u32 {
        match self {
            KeyCode::Char(ch) => u32::from(ch),
            KeyCode::Up => u32::from(b'A'),
            KeyCode::Down => u32::from(b'B'),
            KeyCode::Right => u32::from(b'C'),
            KeyCode::Left => u32::from(b'D'),
            KeyCode::End => u32::from(b'F'),
            KeyCode::Home => u32::from(b'H'),
            KeyCode::Insert => u32::from(b'I'),
            KeyCode::Delete => u32::from(b'X'),
            KeyCode::PageUp => u32::from(b'U'),
            KeyCode::PageDown => u32::from(b'N'),
            KeyCode::Escape => 0x1b,
            KeyCode::Function(number) => FUNCTION_KEY_BASE + u32::from(number),
        }
    }

    fn from_packed(packed: u32, special: bool) -> Option<Self> {
        if !special {
            return char::from_u32(packed).map(KeyCode::Char);
        }
        if packed >= FUNCTION_KEY_BASE {
            return u8::try_from(packed - FUNCTION_KEY_BASE)
                .ok()
                .map(KeyCode::Function);
        }
        let code = match u8::try_from(packed).ok()? {
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'F' => KeyCode::End,
            b'H' => KeyCode::Home,
            b'I' => KeyCode::Insert,
            b'X' => KeyCode::Delete,
            b'U' => KeyCode::PageUp,
            b'N' => KeyCode::PageDown,
            0x1b => KeyCode::Escape,
            _ => return None,
        };
        Some(code)
    }
}

/// A key press with its modifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyEvent {
    /// [`KeyModifiers::SPECIAL`] is set or cleared to match `code`.
    #[must_use]
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut modifiers = modifiers;
        modifiers.set(KeyModifiers::SPECIAL, code.is_special());
        Self { code, modifiers }
    }

    #[must_use]
    pub fn plain(ch: char) -> Self { Self::new(KeyCode::Char(ch), KeyModifiers::empty()) }

    #[must_use]
    pub fn code(&self) -> KeyCode { self.code }

    #[must_use]
    pub fn modifiers(&self) -> KeyModifiers { self.modifiers }

    /// `true` for `Ctrl+<ch>` and nothing else, e.g. `is_ctrl_char('d')` for `Ctrl+D`.
    #[must_use]
    pub fn is_ctrl_char(&self, ch: char) -> bool {
        self.code == KeyCode::Char(ch)
            && self.modifiers & !KeyModifiers::SPECIAL == KeyModifiers::CTRL
    }
}

impl Display for KeyEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (flag, label) in [
            (KeyModifiers::CTRL, "Ctrl+"),
            (KeyModifiers::ALT, "Alt+"),
            (KeyModifiers::SHIFT, "Shift+"),
        ] {
            if self.modifiers.contains(flag) {
                f.write_str(label)?;
            }
        }
        write!(f, "{}", self.code)
    }
}

impl Debug for KeyEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "KeyEvent({self})")
    }
}

// ╭────────────────────────────────────────────────────────────────╮
// │ Mouse                                                          │
// ╰────────────────────────────────────────────────────────────────╯

/// Which button (or none, for [`Move`]) an SGR mouse report is about.
///
/// [`Move`]: MouseButton::Move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// Motion with no button held.
    Move,
    WheelUp,
    WheelDown,
}

impl MouseButton {
    /// SGR button code without modifier or motion flags.
    #[must_use]
    pub fn sgr_code(self) -> u8 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Move => 3,
            MouseButton::WheelUp => SGR_WHEEL_FLAG,
            MouseButton::WheelDown => SGR_WHEEL_FLAG | 1,
        }
    }

    /// Decodes an SGR button code. Returns [`None`] for codes outside the six
    /// supported buttons (extra buttons, horizontal wheel).
    #[must_use]
    pub fn from_sgr_code(code: u8) -> Option<Self> {
        let low_bits = code & 0b11;
        if code & 0b1000_0000 != 0 {
            return None;
        }
        if code & SGR_WHEEL_FLAG != 0 {
            return match low_bits {
                0 => Some(MouseButton::WheelUp),
                1 => Some(MouseButton::WheelDown),
                _ => None,
            };
        }
        Some(match low_bits {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Move,
        })
    }
}

/// An SGR (mode 1006) mouse report. Coordinates are 1-based, as the terminal reports
/// them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    x: u16,
    y: u16,
    /// SGR button code, XOR [`MouseModifiers::RELEASE`] when `released`.
    folded_code: u8,
    released: bool,
}

impl MouseEvent {
    /// Builds an event from the raw SGR button code (`Cb`) and terminator. Returns
    /// [`None`] when the button code is not supported.
    #[must_use]
    pub fn from_sgr(sgr_code: u8, x: u16, y: u16, released: bool) -> Option<Self> {
        MouseButton::from_sgr_code(sgr_code)?;
        let folded_code = if released {
            sgr_code ^ MouseModifiers::RELEASE.bits()
        } else {
            sgr_code
        };
        Some(Self { x, y, folded_code, released })
    }

    /// Builds a press (or release, when `modifiers` has [`MouseModifiers::RELEASE`])
    /// of `button`. [`MouseButton::Move`] gets the motion flag, like a terminal sends
    /// it.
    #[must_use]
    pub fn new(button: MouseButton, modifiers: MouseModifiers, x: u16, y: u16) -> Self {
        let mut sgr_code = button.sgr_code() | (modifiers.bits() & SGR_MODIFIER_MASK);
        if button == MouseButton::Move {
            sgr_code |= SGR_MOTION_FLAG;
        }
        let released = modifiers.contains(MouseModifiers::RELEASE);
        let folded_code = if released {
            sgr_code ^ MouseModifiers::RELEASE.bits()
        } else {
            sgr_code
        };
        Self { x, y, folded_code, released }
    }

    #[must_use]
    pub fn x(&self) -> u16 { self.x }

    #[must_use]
    pub fn y(&self) -> u16 { self.y }

    /// The SGR button code as the terminal sent it (release fold undone).
    #[must_use]
    pub fn sgr_code(&self) -> u8 {
        if self.released {
            self.folded_code ^ MouseModifiers::RELEASE.bits()
        } else {
            self.folded_code
        }
    }

    #[must_use]
    pub fn button(&self) -> MouseButton {
        // Construction rejects unsupported codes, so this never falls back.
        MouseButton::from_sgr_code(self.sgr_code()).unwrap_or(MouseButton::Move)
    }

    #[must_use]
    pub fn modifiers(&self) -> MouseModifiers {
        let mut modifiers =
            MouseModifiers::from_bits_truncate(self.folded_code & SGR_MODIFIER_MASK);
        modifiers.set(MouseModifiers::RELEASE, self.released);
        modifiers
    }

    #[must_use]
    pub fn is_release(&self) -> bool { self.released }

    /// `true` for motion reports: drags and [`MouseButton::Move`].
    #[must_use]
    pub fn is_motion(&self) -> bool {
        !self.released && self.sgr_code() & SGR_MOTION_FLAG != 0
    }
}

impl Display for MouseEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let action = if self.released {
            "release"
        } else if self.is_motion() {
            "motion"
        } else {
            "press"
        };
        let modifiers = self.modifiers() - MouseModifiers::RELEASE;
        write!(f, "Mouse {} {action} at ({}, {})", self.button(), self.x, self.y)?;
        if !modifiers.is_empty() {
            write!(f, " {modifiers:?}")?;
        }
        Ok(())
    }
}

impl Debug for MouseEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MouseEvent({self})")
    }
}

// ╭────────────────────────────────────────────────────────────────╮
// │ Event                                                          │
// ╰────────────────────────────────────────────────────────────────╯

/// Unpacked view of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Key(KeyEvent),
    Mouse(MouseEvent),
}

/// A key or mouse event packed into 8 bytes. See the [module docs](self) for the
/// layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event(u64);

const MODIFIER_BYTE_SHIFT: u32 = 56;
const RELEASE_FLAG_SHIFT: u32 = 32;

impl Event {
    #[allow(clippy::cast_possible_truncation)]
    fn modifier_byte(self) -> u8 { (self.0 >> MODIFIER_BYTE_SHIFT) as u8 }

    #[must_use]
    pub fn is_key(self) -> bool { self.modifier_byte() & KEY_MARKER != 0 }

    #[must_use]
    pub fn is_mouse(self) -> bool { !self.is_key() }

    #[must_use]
    pub fn key(self) -> Option<KeyEvent> { self.is_key().then(|| self.unpack_key()) }

    #[must_use]
    pub fn mouse(self) -> Option<MouseEvent> { self.is_mouse().then(|| self.unpack_mouse()) }

    #[must_use]
    pub fn kind(self) -> EventKind {
        if self.is_key() {
            EventKind::Key(self.unpack_key())
        } else {
            EventKind::Mouse(self.unpack_mouse())
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn unpack_key(self) -> KeyEvent {
        let modifiers = KeyModifiers::from_bits_truncate(self.modifier_byte());
        // Events are only ever built from valid key codes.
        let code = KeyCode::from_packed(
            self.0 as u32,
            modifiers.contains(KeyModifiers::SPECIAL),
        )
        .unwrap_or(KeyCode::Char(char::REPLACEMENT_CHARACTER));
        KeyEvent { code, modifiers }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn unpack_mouse(self) -> MouseEvent {
        MouseEvent {
            x: self.0 as u16,
            y: (self.0 >> 16) as u16,
            folded_code: self.modifier_byte(),
            released: (self.0 >> RELEASE_FLAG_SHIFT) & 1 == 1,
        }
    }

    #[must_use]
    pub fn shift_pressed(self) -> bool { self.modifier_byte() & KeyModifiers::SHIFT.bits() != 0 }

    #[must_use]
    pub fn alt_pressed(self) -> bool { self.modifier_byte() & KeyModifiers::ALT.bits() != 0 }

    #[must_use]
    pub fn ctrl_pressed(self) -> bool { self.modifier_byte() & KeyModifiers::CTRL.bits() != 0 }

    /// The packed representation.
    #[must_use]
    pub fn to_bits(self) -> u64 { self.0 }
}

impl From<KeyEvent> for Event {
    fn from(key: KeyEvent) -> Self {
        let modifier_byte = u64::from(KEY_MARKER | key.modifiers.bits());
        Self((modifier_byte << MODIFIER_BYTE_SHIFT) | u64::from(key.code.to_packed()))
    }
}

impl From<MouseEvent> for Event {
    fn from(mouse: MouseEvent) -> Self {
        Self(
            (u64::from(mouse.folded_code) << MODIFIER_BYTE_SHIFT)
                | (u64::from(mouse.released) << RELEASE_FLAG_SHIFT)
                | (u64::from(mouse.y) << 16)
                | u64::from(mouse.x),
        )
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind() {
            EventKind::Key(key) => Display::fmt(&key, f),
            EventKind::Mouse(mouse) => Display::fmt(&mouse, f),
        }
    }
}

impl Debug for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind() {
            EventKind::Key(key) => Debug::fmt(&key, f),
            EventKind::Mouse(mouse) => Debug::fmt(&mouse, f),
        }
    }
}
