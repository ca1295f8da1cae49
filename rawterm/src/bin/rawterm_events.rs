// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Prints every key and mouse event typed into the terminal until `Ctrl+D`.
//!
//! ```bash
//! cargo run --bin rawterm-events -- --mouse --log-file /tmp/rawterm.log --log-level debug
//! ```

use clap::Parser;
use miette::IntoDiagnostic;
use rawterm::{Pulled, RawModePreset, RawModeSession, ReadTimeout, SessionConfig,
              TracingConfig, WriterConfig};
use std::{io::{self, Write},
          time::Duration};
use tracing_core::LevelFilter;

/// Byte that `Ctrl+D` sends.
const CTRL_D: u8 = 0x04;

#[derive(Debug, Parser)]
#[command(bin_name = "rawterm-events")]
#[command(about = "Print decoded terminal input events until Ctrl+D")]
#[command(version)]
#[command(next_line_help = true)]
/// More info:
/// - <https://docs.rs/clap/latest/clap/_derive/#overview>
pub struct CLIArg {
    #[arg(
        long,
        default_value_t = RawModePreset::Raw,
        help = "Line discipline preset: `raw`, or `cbreak` to keep Ctrl+C and Ctrl+Z"
    )]
    pub mode: RawModePreset,

    #[arg(long, short = 'm', help = "Report mouse movement, clicks and wheel events")]
    pub mouse: bool,

    #[arg(long, short = 'b', help = "Print raw input bytes instead of decoded events")]
    pub bytes: bool,

    #[arg(
        long,
        value_name = "MILLIS",
        help = "Print a line when nothing is typed for this long"
    )]
    pub timeout_ms: Option<u64>,

    #[arg(
        long,
        value_name = "MILLIS",
        help = "Report a lone ESC as the Escape key after this long"
    )]
    pub esc_timeout_ms: Option<u64>,

    #[arg(long, value_name = "PATH", help = "Write tracing output to this file")]
    pub log_file: Option<String>,

    #[arg(
        long,
        default_value_t = LevelFilter::DEBUG,
        help = "Tracing level for --log-file: off, error, warn, info, debug, trace"
    )]
    pub log_level: LevelFilter,
}

impl CLIArg {
    fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_preset(self.mode)
            .with_read_timeout(match self.timeout_ms {
                Some(millis) => ReadTimeout::After(Duration::from_millis(millis)),
                None => ReadTimeout::Forever,
            })
            .with_esc_timeout(self.esc_timeout_ms.map(Duration::from_millis))
    }

    fn tracing_config(&self) -> TracingConfig {
        match &self.log_file {
            Some(path) => TracingConfig::new_file(path.clone(), self.log_level),
            None => TracingConfig {
                writer_config: WriterConfig::None,
                level_filter: LevelFilter::OFF,
            },
        }
    }
}

fn main() -> miette::Result<()> {
    let cli_arg = CLIArg::parse();

    cli_arg.tracing_config().install_global()?;
    // % is Display, ? is Debug.
    tracing::debug!(message = "Start logging...", cli_arg = ?cli_arg);

    let session = RawModeSession::open(cli_arg.session_config())?;
    let result = run(&session, &cli_arg);
    session.close()?;

    tracing::debug!(message = "Stop logging...");
    result
}

fn run(session: &RawModeSession, cli_arg: &CLIArg) -> miette::Result<()> {
    let _mouse_tracking = cli_arg
        .mouse
        .then(|| session.enable_mouse_tracking())
        .transpose()?;

    let mut stdout = io::stdout().lock();
    write!(
        stdout,
        "{} mode, {}x{}. Press Ctrl+D to quit.\r\n",
        session.config().preset,
        session.terminal_size().cols,
        session.terminal_size().rows,
    )
    .into_diagnostic()?;
    stdout.flush().into_diagnostic()?;

    if cli_arg.bytes {
        print_bytes(session, &mut stdout)
    } else {
        print_events(session, &mut stdout)
    }
}

fn print_events(session: &RawModeSession, stdout: &mut impl Write) -> miette::Result<()> {
    let mut events = session.event_stream();
    loop {
        match events.pull() {
            Ok(Pulled::Ready(event)) => {
                write!(stdout, "{event}\r\n").into_diagnostic()?;
                if event.key().is_some_and(|key| key.is_ctrl_char('d')) {
                    return Ok(());
                }
            }
            Ok(Pulled::TimedOut) => write!(stdout, "(idle)\r\n").into_diagnostic()?,
            Ok(Pulled::Closed) => return Ok(()),
            Err(error) if error.is_protocol_violation() => {
                write!(stdout, "skipped: {error}\r\n").into_diagnostic()?;
            }
            Err(error) => return Err(error.into()),
        }
        stdout.flush().into_diagnostic()?;
    }
}

fn print_bytes(session: &RawModeSession, stdout: &mut impl Write) -> miette::Result<()> {
    let mut bytes = session.input_stream();
    loop {
        match bytes.pull()? {
            Pulled::Ready(byte) => {
                write!(stdout, "{byte:#04x} {:?}\r\n", char::from(byte)).into_diagnostic()?;
                if byte == CTRL_D {
                    return Ok(());
                }
            }
            Pulled::TimedOut => write!(stdout, "(idle)\r\n").into_diagnostic()?,
            Pulled::Closed => return Ok(()),
        }
        stdout.flush().into_diagnostic()?;
    }
}
