// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Test-only input sources and terminals.

// Attach sources.
pub mod pty_pair;
pub mod scripted_source;

// Re-export.
pub use pty_pair::*;
pub use scripted_source::*;
