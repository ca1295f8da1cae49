// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Wiring for [`tracing`] output.
//!
//! While a session is open the terminal is in raw mode, so log lines written to it
//! come out without carriage returns and get mixed into the program's own output. Log
//! to a file with [`WriterConfig::File`] instead, and `tail -f` it from another
//! terminal.

// Attach sources.
pub mod rolling_file_appender_impl;
pub mod tracing_config;
pub mod tracing_init;

// Re-export.
pub use tracing_config::*;
pub use tracing_init::*;
