// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{InputSource, ReadTimeout};
use std::{collections::VecDeque, io};

/// One scripted response of a [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Data for the next read. A read with a smaller buffer leaves the rest queued.
    Chunk(Vec<u8>),
    /// The next readiness wait times out.
    Timeout,
    WaitError(io::ErrorKind),
    WaitRawOsError(i32),
    ReadError(io::ErrorKind),
    ReadRawOsError(i32),
}

/// [`InputSource`] that replays a script. Once the script runs out, every read reports
/// end of input.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self { steps: steps.into_iter().collect() }
    }

    pub fn from_chunks(chunks: impl IntoIterator<Item = impl AsRef<[u8]>>) -> Self {
        Self::new(
            chunks
                .into_iter()
                .map(|it| ScriptStep::Chunk(it.as_ref().to_vec())),
        )
    }
}

impl InputSource for ScriptedSource {
    fn wait_readable(&mut self, _timeout: ReadTimeout) -> io::Result<bool> {
        match self.steps.front() {
            Some(ScriptStep::Timeout) => {
                self.steps.pop_front();
                Ok(false)
            }
            Some(ScriptStep::WaitError(kind)) => {
                let error = io::Error::from(*kind);
                self.steps.pop_front();
                Err(error)
            }
            Some(ScriptStep::WaitRawOsError(code)) => {
                let error = io::Error::from_raw_os_error(*code);
                self.steps.pop_front();
                Err(error)
            }
            _ => Ok(true),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            None => Ok(0),
            Some(ScriptStep::Chunk(bytes)) => {
                let count = bytes.len().min(buf.len());
                buf[..count].copy_from_slice(&bytes[..count]);
                if count < bytes.len() {
                    self.steps.push_front(ScriptStep::Chunk(bytes[count..].to_vec()));
                }
                Ok(count)
            }
            Some(ScriptStep::ReadError(kind)) => Err(kind.into()),
            Some(ScriptStep::ReadRawOsError(code)) => Err(io::Error::from_raw_os_error(code)),
            Some(step) => {
                // Wait steps belong to `wait_readable()`.
                self.steps.push_front(step);
                Err(io::ErrorKind::WouldBlock.into())
            }
        }
    }
}
