// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words SIGSEGV SIGILL SIGFPE SIGABRT SIGTSTP SIGCONT

use nix::sys::signal::Signal;
use strum_macros::{Display, EnumCount, EnumIter};

/// Signals a [`RawModeSession`](crate::RawModeSession) installs handlers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum HandledSignal {
    Interrupt,
    SegmentationFault,
    Terminate,
    IllegalInstruction,
    FloatingPointException,
    Abort,
    /// Suspend request, eg: `Ctrl+Z` in cbreak mode.
    TerminalStop,
    /// Only handled between a [`HandledSignal::TerminalStop`] and the resume after it.
    Continue,
}

impl HandledSignal {
    /// Restore the terminal, then die the way the signal says.
    pub const FATAL: [HandledSignal; 6] = [
        HandledSignal::Interrupt,
        HandledSignal::SegmentationFault,
        HandledSignal::Terminate,
        HandledSignal::IllegalInstruction,
        HandledSignal::FloatingPointException,
        HandledSignal::Abort,
    ];

    #[must_use]
    pub fn signal(self) -> Signal {
        match self {
            HandledSignal::Interrupt => Signal::SIGINT,
            HandledSignal::SegmentationFault => Signal::SIGSEGV,
            HandledSignal::Terminate => Signal::SIGTERM,
            HandledSignal::IllegalInstruction => Signal::SIGILL,
            HandledSignal::FloatingPointException => Signal::SIGFPE,
            HandledSignal::Abort => Signal::SIGABRT,
            HandledSignal::TerminalStop => Signal::SIGTSTP,
            HandledSignal::Continue => Signal::SIGCONT,
        }
    }

    #[must_use]
    pub fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::SIGINT => Some(HandledSignal::Interrupt),
            Signal::SIGSEGV => Some(HandledSignal::SegmentationFault),
            Signal::SIGTERM => Some(HandledSignal::Terminate),
            Signal::SIGILL => Some(HandledSignal::IllegalInstruction),
            Signal::SIGFPE => Some(HandledSignal::FloatingPointException),
            Signal::SIGABRT => Some(HandledSignal::Abort),
            Signal::SIGTSTP => Some(HandledSignal::TerminalStop),
            Signal::SIGCONT => Some(HandledSignal::Continue),
            _ => None,
        }
    }

    /// Slot in the saved disposition table.
    pub(crate) fn index(self) -> usize { self as usize }
}
