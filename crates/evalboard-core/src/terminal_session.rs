#![forbid(unsafe_code)]

//! RAII terminal session for the console.
//!
//! [`TerminalSession`] takes over the terminal when built and gives it back
//! when dropped. The same teardown runs from a panic hook and, on Unix, from
//! a SIGINT/SIGTERM watcher, so a crashed console never leaves the shell in
//! raw mode.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use crate::event::Event;

/// Which terminal modes the session turns on.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Draw on the alternate screen so the shell scrollback survives.
    pub alternate_screen: bool,
    /// Deliver pasted text as a single [`Event::Paste`].
    pub bracketed_paste: bool,
    /// Report focus gained / lost.
    pub focus_events: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            bracketed_paste: true,
            focus_events: false,
        }
    }
}

/// A mode switched on by the session, in the order it was enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    AlternateScreen,
    BracketedPaste,
    FocusEvents,
    HiddenCursor,
}

impl Mode {
    fn enable(self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Mode::AlternateScreen => crossterm::execute!(out, crossterm::terminal::EnterAlternateScreen),
            Mode::BracketedPaste => crossterm::execute!(out, crossterm::event::EnableBracketedPaste),
            Mode::FocusEvents => crossterm::execute!(out, crossterm::event::EnableFocusChange),
            Mode::HiddenCursor => crossterm::execute!(out, crossterm::cursor::Hide),
        }
    }

    fn disable(self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Mode::AlternateScreen => crossterm::execute!(out, crossterm::terminal::LeaveAlternateScreen),
            Mode::BracketedPaste => crossterm::execute!(out, crossterm::event::DisableBracketedPaste),
            Mode::FocusEvents => crossterm::execute!(out, crossterm::event::DisableFocusChange),
            Mode::HiddenCursor => crossterm::execute!(out, crossterm::cursor::Show),
        }
    }
}

/// Teardown order when the session is not around to say what it enabled.
const ALL_MODES_REVERSED: [Mode; 4] = [
    Mode::HiddenCursor,
    Mode::FocusEvents,
    Mode::BracketedPaste,
    Mode::AlternateScreen,
];

#[derive(Debug)]
pub struct TerminalSession {
    enabled: Vec<Mode>,
    #[cfg(unix)]
    _signals: unix::SignalWatcher,
}

impl TerminalSession {
    /// Enter raw mode and enable the requested modes.
    ///
    /// If a mode switch fails, whatever was already enabled is rolled back
    /// before the error is returned.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        install_panic_hook();
        #[cfg(unix)]
        let signals = unix::SignalWatcher::spawn()?;
        crossterm::terminal::enable_raw_mode()?;
        #[cfg(feature = "tracing")]
        tracing::info!(target: "evalboard.terminal", "raw mode enabled");

        let mut session = Self {
            enabled: Vec::with_capacity(4),
            #[cfg(unix)]
            _signals: signals,
        };
        let wanted = [
            (options.alternate_screen, Mode::AlternateScreen),
            (options.bracketed_paste, Mode::BracketedPaste),
            (options.focus_events, Mode::FocusEvents),
            (true, Mode::HiddenCursor),
        ];
        let mut stdout = io::stdout();
        for mode in wanted.into_iter().filter_map(|(on, mode)| on.then_some(mode)) {
            // On error `session` drops here and restores the terminal.
            mode.enable(&mut stdout)?;
            session.enabled.push(mode);
        }
        Ok(session)
    }

    /// Current terminal size as (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    /// Returns `Ok(true)` if an event is ready within `timeout`.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<bool> {
        crossterm::event::poll(timeout)
    }

    /// Read the next event. `Ok(None)` for input the console ignores.
    pub fn read_event(&self) -> io::Result<Option<Event>> {
        Ok(Event::from_crossterm(crossterm::event::read()?))
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        while let Some(mode) = self.enabled.pop() {
            let _ = mode.disable(&mut stdout);
        }
        // Raw mode goes last.
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = stdout.flush();
        #[cfg(feature = "tracing")]
        tracing::info!(target: "evalboard.terminal", "terminal restored");
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_everything();
            previous(info);
        }));
    });
}

/// Undo every mode the session might have enabled. Safe to run twice.
fn restore_everything() {
    let mut stdout = io::stdout();
    for mode in ALL_MODES_REVERSED {
        let _ = mode.disable(&mut stdout);
    }
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}

#[cfg(unix)]
mod unix {
    use std::io;
    use std::thread::JoinHandle;

    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::{Handle, Signals};

    /// Restores the terminal and exits on SIGINT/SIGTERM while alive.
    #[derive(Debug)]
    pub(super) struct SignalWatcher {
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    }

    impl SignalWatcher {
        pub(super) fn spawn() -> io::Result<Self> {
            let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
            let handle = signals.handle();
            let thread = std::thread::spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(target: "evalboard.terminal", signal, "termination signal received");
                    super::restore_everything();
                    std::process::exit(128 + signal);
                }
            });
            Ok(Self {
                handle,
                thread: Some(thread),
            })
        }
    }

    impl Drop for SignalWatcher {
        fn drop(&mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_teardown_reverses_enable_order() {
        let enable_order = [
            Mode::AlternateScreen,
            Mode::BracketedPaste,
            Mode::FocusEvents,
            Mode::HiddenCursor,
        ];
        let mut reversed = enable_order;
        reversed.reverse();
        assert_eq!(reversed, ALL_MODES_REVERSED);
    }

    #[test]
    fn default_options_use_alternate_screen() {
        let options = SessionOptions::default();
        assert!(options.alternate_screen);
        assert!(options.bracketed_paste);
        assert!(!options.focus_events);
    }
}
