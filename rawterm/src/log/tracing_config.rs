// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tracing_core::LevelFilter;

/// Where log output goes, and how much of it.
///
/// Logging is off unless [`TracingConfig::install_global()`] is called with a level
/// other than [`LevelFilter::OFF`] and a writer other than [`WriterConfig::None`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub writer_config: WriterConfig,
    pub level_filter: LevelFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterConfig {
    None,
    /// Fine before and after a session, garbled during one.
    Stderr,
    File(String /* log file path */),
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            writer_config: WriterConfig::None,
            level_filter: LevelFilter::OFF,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn new_file(path: impl Into<String>, level_filter: LevelFilter) -> Self {
        Self {
            writer_config: WriterConfig::File(path.into()),
            level_filter,
        }
    }

    #[must_use]
    pub fn new_stderr(level_filter: LevelFilter) -> Self {
        Self {
            writer_config: WriterConfig::Stderr,
            level_filter,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.level_filter != LevelFilter::OFF && self.writer_config != WriterConfig::None
    }
}
