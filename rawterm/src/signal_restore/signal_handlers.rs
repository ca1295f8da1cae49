// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words SIGTSTP SIGCONT sigaction

use super::HandledSignal;
use crate::{SessionError,
            terminal_raw_mode::{DEBUG_RAWTERM_SESSION, mouse_tracking,
                                session_state::{self, SignalSafeCell}}};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, raise, sigaction};
use std::ffi::c_int;
use strum::{EnumCount, IntoEnumIterator};

/// Dispositions that were in place before the handlers were installed, indexed by
/// [`HandledSignal::index()`].
static PREVIOUS_DISPOSITIONS: [SignalSafeCell<SigAction>; HandledSignal::COUNT] =
    [const { SignalSafeCell::new() }; HandledSignal::COUNT];

/// Installs the fatal signal and `SIGTSTP` handlers. If any of them fails, the ones
/// already installed are removed again.
///
/// # Errors
///
/// [`SessionError::SignalInstall`] naming the signal that failed.
pub(crate) fn install_handlers() -> Result<(), SessionError> {
    let result = HandledSignal::FATAL
        .into_iter()
        .chain([HandledSignal::TerminalStop])
        .try_for_each(|handled| {
            install(handled).map_err(|source| SessionError::SignalInstall {
                signal: handled.signal(),
                source,
            })
        });

    if result.is_err() {
        uninstall_handlers();
        return result;
    }

    DEBUG_RAWTERM_SESSION.then(|| {
        tracing::debug!(message = "terminal restoring signal handlers installed");
    });
    Ok(())
}

/// Reinstates every saved disposition. Signals that were never handled are left alone.
pub(crate) fn uninstall_handlers() {
    for handled in HandledSignal::iter() {
        reinstate(handled, false);
    }

    DEBUG_RAWTERM_SESSION.then(|| {
        tracing::debug!(message = "terminal restoring signal handlers removed");
    });
}

/// What every handler does before the process stops running normally. Async-signal-safe.
pub(crate) fn restore_terminal() {
    mouse_tracking::write_disable_if_active();
    session_state::apply_original_termios().ok();
}

/// Undoes [`restore_terminal()`] after a resume. Async-signal-safe.
pub(crate) fn reenter_terminal() {
    session_state::apply_session_termios().ok();
    mouse_tracking::write_enable_if_active();
}

fn handler_for(handled: HandledSignal) -> extern "C" fn(c_int) {
    match handled {
        HandledSignal::TerminalStop => handle_terminal_stop,
        HandledSignal::Continue => handle_continue,
        _ => handle_fatal_signal,
    }
}

/// Points `handled` at its handler, saving the current disposition unless one is
/// already saved. Async-signal-safe.
fn install(handled: HandledSignal) -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handler_for(handled)),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: The handlers in this module only make async-signal-safe calls.
    let previous = unsafe { sigaction(handled.signal(), &action) }?;
    let cell = &PREVIOUS_DISPOSITIONS[handled.index()];
    if !cell.is_set() {
        cell.store(previous);
    }
    Ok(())
}

/// Puts the saved disposition for `handled` back. With `or_default`, falls back to
/// `SIG_DFL` when nothing was saved. Async-signal-safe.
fn reinstate(handled: HandledSignal, or_default: bool) {
    let action = match PREVIOUS_DISPOSITIONS[handled.index()].take() {
        Some(previous) => previous,
        None if or_default => {
            SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty())
        }
        None => return,
    };
    // SAFETY: Restores a disposition the process had before, or the default.
    unsafe { sigaction(handled.signal(), &action) }.ok();
}

extern "C" fn handle_fatal_signal(signum: c_int) {
    restore_terminal();
    let Ok(signal) = Signal::try_from(signum) else {
        return;
    };
    let Some(handled) = HandledSignal::from_signal(signal) else {
        return;
    };
    reinstate(handled, true);
    // Blocked while this handler runs, delivered with the reinstated disposition on
    // return.
    raise(signal).ok();
}

extern "C" fn handle_terminal_stop(_: c_int) {
    install(HandledSignal::Continue).ok();
    restore_terminal();
    reinstate(HandledSignal::TerminalStop, true);
    raise(Signal::SIGTSTP).ok();
}

extern "C" fn handle_continue(_: c_int) {
    install(HandledSignal::TerminalStop).ok();
    reenter_terminal();
    reinstate(HandledSignal::Continue, true);
    raise(Signal::SIGCONT).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MOUSE_TRACKING_DISABLE, MOUSE_TRACKING_ENABLE, RawModeSession, SessionConfig,
                test_fixtures::PtyPair};
    use pretty_assertions::assert_eq;
    use rustix::termios::LocalModes;
    use serial_test::serial;
    use std::{os::unix::process::ExitStatusExt,
              process::{Command, Stdio},
              sync::atomic::{AtomicBool, Ordering}};

    fn current_disposition(signal: Signal) -> SigAction {
        let probe = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        let current = unsafe { sigaction(signal, &probe) }.unwrap();
        unsafe { sigaction(signal, &current) }.unwrap();
        current
    }

    fn set_disposition(signal: Signal, handler: SigHandler) {
        let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
        unsafe { sigaction(signal, &action) }.unwrap();
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    #[serial(raw_mode_session)]
    fn install_then_uninstall_puts_dispositions_back() {
        set_disposition(Signal::SIGTERM, SigHandler::SigDfl);
        set_disposition(Signal::SIGTSTP, SigHandler::SigIgn);
        set_disposition(Signal::SIGCONT, SigHandler::SigDfl);

        install_handlers().unwrap();
        assert!(matches!(current_disposition(Signal::SIGTERM).handler(), SigHandler::Handler(_)));
        assert!(matches!(current_disposition(Signal::SIGTSTP).handler(), SigHandler::Handler(_)));
        // Only installed while suspended.
        assert!(matches!(current_disposition(Signal::SIGCONT).handler(), SigHandler::SigDfl));

        uninstall_handlers();
        assert!(matches!(current_disposition(Signal::SIGTERM).handler(), SigHandler::SigDfl));
        assert!(matches!(current_disposition(Signal::SIGTSTP).handler(), SigHandler::SigIgn));

        set_disposition(Signal::SIGTSTP, SigHandler::SigDfl);
    }

    static INTERRUPTED: AtomicBool = AtomicBool::new(false);

    extern "C" fn record_interrupt(_: c_int) { INTERRUPTED.store(true, Ordering::SeqCst); }

    #[test]
    #[serial(raw_mode_session)]
    fn fatal_signal_restores_terminal_then_reaches_previous_handler() {
        INTERRUPTED.store(false, Ordering::SeqCst);
        set_disposition(Signal::SIGINT, SigHandler::Handler(record_interrupt));

        let pty = PtyPair::open().unwrap();
        let before = pty.slave_local_modes().unwrap();
        let session = RawModeSession::open_on(pty.terminal_fds(), SessionConfig::default())
            .unwrap();
        let guard = session.enable_mouse_tracking().unwrap();
        drop(pty.read_output(50).unwrap());
        assert!(!pty.slave_local_modes().unwrap().contains(LocalModes::ICANON));

        raise(Signal::SIGINT).unwrap();

        assert!(INTERRUPTED.load(Ordering::SeqCst));
        assert_eq!(pty.slave_local_modes().unwrap(), before);
        assert!(contains(&pty.read_output(50).unwrap(), MOUSE_TRACKING_DISABLE));
        // The previous handler is back in place.
        assert!(matches!(current_disposition(Signal::SIGINT).handler(), SigHandler::Handler(_)));

        drop(guard);
        session.close().unwrap();
        set_disposition(Signal::SIGINT, SigHandler::SigDfl);
    }

    static STOPPED: AtomicBool = AtomicBool::new(false);

    extern "C" fn record_stop(_: c_int) { STOPPED.store(true, Ordering::SeqCst); }

    #[test]
    #[serial(raw_mode_session)]
    fn stop_and_continue_alternate_exactly() {
        // A previous SIGTSTP handler that doesn't actually stop the test process.
        STOPPED.store(false, Ordering::SeqCst);
        set_disposition(Signal::SIGTSTP, SigHandler::Handler(record_stop));
        set_disposition(Signal::SIGCONT, SigHandler::SigDfl);

        let pty = PtyPair::open().unwrap();
        let before = pty.slave_local_modes().unwrap();
        let session = RawModeSession::open_on(pty.terminal_fds(), SessionConfig::default())
            .unwrap();
        let guard = session.enable_mouse_tracking().unwrap();
        drop(pty.read_output(50).unwrap());

        // Suspend.
        raise(Signal::SIGTSTP).unwrap();
        assert!(STOPPED.load(Ordering::SeqCst));
        assert_eq!(pty.slave_local_modes().unwrap(), before);
        assert!(contains(&pty.read_output(50).unwrap(), MOUSE_TRACKING_DISABLE));
        assert!(matches!(current_disposition(Signal::SIGCONT).handler(), SigHandler::Handler(_)));

        // Resume.
        raise(Signal::SIGCONT).unwrap();
        assert!(!pty.slave_local_modes().unwrap().contains(LocalModes::ICANON));
        assert!(contains(&pty.read_output(50).unwrap(), MOUSE_TRACKING_ENABLE));
        assert!(matches!(current_disposition(Signal::SIGCONT).handler(), SigHandler::SigDfl));

        // Suspending again goes through the handler, not straight to `record_stop`.
        STOPPED.store(false, Ordering::SeqCst);
        raise(Signal::SIGTSTP).unwrap();
        assert!(STOPPED.load(Ordering::SeqCst));
        assert_eq!(pty.slave_local_modes().unwrap(), before);
        raise(Signal::SIGCONT).unwrap();

        drop(guard);
        session.close().unwrap();
        set_disposition(Signal::SIGTSTP, SigHandler::SigDfl);
        set_disposition(Signal::SIGCONT, SigHandler::SigDfl);
    }

    // XMARK: Process isolated test.

    const ISOLATED_TEST_RUNNER: &str = "ISOLATED_TEST_RUNNER";

    /// Runs in the child process, with the PTY slave as stdin and stdout. Never returns
    /// if the handler does its job.
    fn open_session_then_terminate() {
        set_disposition(Signal::SIGTERM, SigHandler::SigDfl);
        let session = RawModeSession::open(SessionConfig::default()).unwrap();
        let guard = session.enable_mouse_tracking().unwrap();
        raise(Signal::SIGTERM).unwrap();
        drop(guard);
        drop(session);
    }

    #[test]
    fn fatal_signal_with_default_disposition_terminates_after_restoring() {
        if std::env::var(ISOLATED_TEST_RUNNER).is_ok() {
            open_session_then_terminate();
            // Still alive: the coordinator sees a normal exit and fails.
            std::process::exit(0);
        }

        let pty = PtyPair::open().unwrap();
        let before = pty.slave_local_modes().unwrap();

        let status = Command::new(std::env::current_exe().unwrap())
            .env(ISOLATED_TEST_RUNNER, "1")
            .args([
                "--test-threads",
                "1",
                "--nocapture",
                "fatal_signal_with_default_disposition_terminates_after_restoring",
            ])
            .stdin(Stdio::from(pty.slave.try_clone().unwrap()))
            .stdout(Stdio::from(pty.slave.try_clone().unwrap()))
            .stderr(Stdio::null())
            .status()
            .unwrap();

        assert_eq!(status.signal(), Some(Signal::SIGTERM as i32), "{status:?}");
        assert_eq!(pty.slave_local_modes().unwrap(), before);
        assert!(contains(&pty.read_output(50).unwrap(), MOUSE_TRACKING_DISABLE));
    }
}
