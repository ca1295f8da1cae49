// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words openpt grantpt unlockpt ptsname ptmx NOCTTY

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use rustix::{fd::{AsFd, AsRawFd, OwnedFd},
             fs::{Mode, OFlags},
             pty::{OpenptFlags, grantpt, openpt, ptsname, unlockpt},
             termios::{LocalModes, tcgetattr}};
use std::io;

use crate::TerminalFds;

/// An in-process pseudo terminal. Tests drive the `slave` end like a real terminal and
/// play the terminal emulator through the `master` end.
#[derive(Debug)]
pub struct PtyPair {
    pub master: OwnedFd,
    pub slave: OwnedFd,
}

impl PtyPair {
    /// # Errors
    ///
    /// When `/dev/ptmx` is not available.
    pub fn open() -> io::Result<Self> {
        let master = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY)?;
        grantpt(&master)?;
        unlockpt(&master)?;
        let slave_name = ptsname(&master, Vec::new())?;
        let slave = rustix::fs::open(
            slave_name.as_c_str(),
            OFlags::RDWR | OFlags::NOCTTY,
            Mode::empty(),
        )?;
        Ok(Self { master, slave })
    }

    /// The slave end as both the input and the output of a session.
    pub fn terminal_fds(&self) -> TerminalFds {
        // SAFETY: Tests drop the session before the pair.
        unsafe { TerminalFds::from_raw(self.slave.as_raw_fd(), self.slave.as_raw_fd()) }
    }

    /// Types `bytes` into the terminal.
    pub fn type_input(&self, bytes: &[u8]) -> io::Result<()> {
        let mut rest = bytes;
        while !rest.is_empty() {
            let written = rustix::io::write(&self.master, rest)?;
            rest = &rest[written..];
        }
        Ok(())
    }

    /// Everything the program wrote to the terminal, waiting up to `timeout_ms` for
    /// each chunk.
    pub fn read_output(&self, timeout_ms: u16) -> io::Result<Vec<u8>> {
        let mut output = vec![];
        let mut buf = [0_u8; 256];
        loop {
            let mut poll_fds = [PollFd::new(self.master.as_fd(), PollFlags::POLLIN)];
            if poll(&mut poll_fds, PollTimeout::from(timeout_ms))? == 0 {
                return Ok(output);
            }
            let count = rustix::io::read(&self.master, &mut buf[..])?;
            if count == 0 {
                return Ok(output);
            }
            output.extend_from_slice(&buf[..count]);
        }
    }

    pub fn slave_local_modes(&self) -> io::Result<LocalModes> {
        Ok(tcgetattr(&self.slave)?.local_modes)
    }
}
