// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words cbreak ICANON ISIG VMIN VTIME

use rustix::termios::{LocalModes, SpecialCodeIndex, Termios};
use strum_macros::{Display, EnumString};

/// Which line discipline flags a [`RawModeSession`](crate::RawModeSession) clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RawModePreset {
    /// Clear canonical mode, echo and signal generation.
    #[default]
    Raw,
    /// Clear canonical mode and echo. Ctrl+C and Ctrl+Z still raise signals.
    Cbreak,
}

impl RawModePreset {
    #[must_use]
    pub fn cleared_local_modes(self) -> LocalModes {
        match self {
            RawModePreset::Raw => LocalModes::ICANON | LocalModes::ECHO | LocalModes::ISIG,
            RawModePreset::Cbreak => LocalModes::ICANON | LocalModes::ECHO,
        }
    }

    /// Clears the preset's flags in `termios` and sets `VMIN=1`, `VTIME=0` so a
    /// `read()` returns as soon as one byte is available.
    pub fn apply(self, termios: &mut Termios) {
        termios.local_modes.remove(self.cleared_local_modes());
        termios.special_codes[SpecialCodeIndex::VMIN] = 1;
        termios.special_codes[SpecialCodeIndex::VTIME] = 0;
    }
}
