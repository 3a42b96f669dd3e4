#![forbid(unsafe_code)]

//! Elm-style runtime.
//!
//! A [`Model`] owns all state. Input becomes messages, `update` turns a
//! message into new state plus a [`Cmd`] describing side effects, and `view`
//! draws the current state into a [`Frame`]. [`Program`] drives the loop
//! against a real terminal; [`ProgramSimulator`](crate::simulator::ProgramSimulator)
//! drives the same model headlessly in tests.
//!
//! ```ignore
//! impl Model for Console {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         match msg {
//!             Msg::Quit => Cmd::quit(),
//!             Msg::Refresh => Cmd::task("profile.fetch", move || Msg::Fetched(api.fetch_profile())),
//!             _ => Cmd::none(),
//!         }
//!     }
//!
//!     fn view(&self, frame: &mut Frame) { /* draw */ }
//! }
//! ```

use std::fmt;
use std::io::{self, Stdout};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use evalboard_core::event::Event;
use evalboard_core::terminal_session::{SessionOptions, TerminalSession};
use tracing::{debug, info, info_span};

use crate::presenter::Presenter;
use crate::render::Frame;
use crate::subscription::{Subscription, SubscriptionManager};

/// Application state and behaviour.
pub trait Model: Sized {
    /// Messages must be constructible from terminal events.
    type Message: From<Event> + Send + 'static;

    /// Startup side effects.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    fn view(&self, frame: &mut Frame);

    /// Subscriptions wanted right now. Re-read after every update; anything
    /// not returned any more is stopped.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![]
    }
}

/// Side effects requested by `init` or `update`.
#[derive(Default)]
pub enum Cmd<M> {
    #[default]
    None,
    Quit,
    /// Run several commands in order.
    Batch(Vec<Cmd<M>>),
    /// Feed a message straight back into `update`.
    Msg(M),
    /// Record a line in the application log.
    Log(String),
    /// Run a blocking closure off the UI thread; its result comes back as a message.
    Task(String, Box<dyn FnOnce() -> M + Send>),
}

impl<M: fmt::Debug> fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
            Self::Task(name, _) => f.debug_tuple("Task").field(name).finish(),
        }
    }
}

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[inline]
    pub fn log(text: impl Into<String>) -> Self {
        Self::Log(text.into())
    }

    pub fn task(name: impl Into<String>, f: impl FnOnce() -> M + Send + 'static) -> Self {
        Self::Task(name.into(), Box::new(f))
    }

    /// Flattens trivial batches.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds
            .into_iter()
            .filter(|c| !matches!(c, Cmd::None))
            .collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Batch(cmds),
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Runtime knobs.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    pub session: SessionOptions,
    /// How long to wait for input before servicing tasks and subscriptions.
    pub poll_interval: Duration,
    /// Quit automatically after this long (smoke tests, demos).
    pub exit_after: Option<Duration>,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            poll_interval: Duration::from_millis(50),
            exit_after: None,
        }
    }
}

/// Terminal-backed driver for a [`Model`].
pub struct Program<M: Model> {
    model: M,
    config: ProgramConfig,
    session: TerminalSession,
    presenter: Presenter,
    subscriptions: SubscriptionManager<M::Message>,
    task_tx: mpsc::Sender<M::Message>,
    task_rx: mpsc::Receiver<M::Message>,
    size: (u16, u16),
    running: bool,
    dirty: bool,
}

impl<M: Model> Program<M> {
    /// Take over the terminal.
    pub fn new(model: M, config: ProgramConfig) -> io::Result<Self> {
        let session = TerminalSession::new(config.session.clone())?;
        let size = session.size()?;
        let (task_tx, task_rx) = mpsc::channel();
        Ok(Self {
            model,
            config,
            session,
            presenter: Presenter::new(),
            subscriptions: SubscriptionManager::new(),
            task_tx,
            task_rx,
            size,
            running: true,
            dirty: true,
        })
    }

    /// Run until the model quits. The terminal is restored when `self` drops.
    pub fn run(&mut self) -> io::Result<()> {
        let _span = info_span!("program.run").entered();
        info!(target: "evalboard.runtime", width = self.size.0, height = self.size.1, "program started");
        let started = Instant::now();
        let mut stdout = io::stdout();

        let cmd = self.model.init();
        self.execute(cmd);
        self.reconcile();
        // The model only hears about later resizes otherwise.
        let (width, height) = self.size;
        self.dispatch(M::Message::from(Event::Resize { width, height }));

        while self.running {
            if self.dirty {
                self.render(&mut stdout)?;
            }

            if self.session.poll_event(self.config.poll_interval)?
                && let Some(event) = self.session.read_event()?
            {
                if let Event::Resize { width, height } = event {
                    self.size = (width, height);
                    self.presenter.invalidate();
                }
                self.dispatch(M::Message::from(event));
            }

            for msg in self.task_rx.try_iter().collect::<Vec<_>>() {
                self.dispatch(msg);
            }
            for msg in self.subscriptions.drain_messages() {
                self.dispatch(msg);
            }

            if let Some(limit) = self.config.exit_after
                && started.elapsed() >= limit
            {
                info!(target: "evalboard.runtime", "exit-after deadline reached");
                self.running = false;
            }
        }

        self.subscriptions.stop_all();
        info!(target: "evalboard.runtime", "program stopped");
        Ok(())
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    fn dispatch(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute(cmd);
        self.reconcile();
        self.dirty = true;
    }

    fn reconcile(&mut self) {
        self.subscriptions.reconcile(self.model.subscriptions());
    }

    fn execute(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.execute(cmd);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Msg(msg) => {
                let cmd = self.model.update(msg);
                self.execute(cmd);
            }
            Cmd::Log(text) => info!(target: "evalboard.app", "{text}"),
            Cmd::Task(name, f) => {
                debug!(target: "evalboard.runtime", task = %name, "spawning task");
                let tx = self.task_tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("task:{name}"))
                    .spawn(move || {
                        let _ = tx.send(f());
                    });
                if let Err(error) = spawned {
                    tracing::error!(target: "evalboard.runtime", task = %name, %error, "failed to spawn task");
                }
            }
        }
    }

    fn render(&mut self, out: &mut Stdout) -> io::Result<()> {
        let mut frame = Frame::new(self.size.0, self.size.1);
        self.model.view(&mut frame);
        self.presenter.present(&frame, out)?;
        self.dirty = false;
        Ok(())
    }
}
