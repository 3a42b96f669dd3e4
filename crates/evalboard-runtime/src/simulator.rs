#![forbid(unsafe_code)]

//! Deterministic headless driver for [`Model`] tests.
//!
//! Tasks run synchronously on the calling thread, subscriptions never start
//! threads (use [`tick_subscriptions`](ProgramSimulator::tick_subscriptions)
//! to fire every declared subscription once) and frames are captured as
//! [`Buffer`]s for text assertions. Rendering at a new size first delivers
//! an [`Event::Resize`], the same way the program loop reports the terminal
//! size before its first frame.
//!
//! ```ignore
//! let mut sim = ProgramSimulator::new(Console::new(deps));
//! sim.init();
//! sim.inject_event(Event::Key(KeyEvent::char('k')));
//! assert!(sim.model().palette_open());
//! assert!(sim.capture_frame(100, 30).contains_text("Command palette"));
//! ```

use evalboard_core::event::Event;

use crate::program::{Cmd, Model};
use crate::render::{Buffer, Frame};
use crate::subscription::SubId;

/// What the simulator executed, for assertions on side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    Quit,
    Msg,
    Batch(usize),
    Log(String),
    Task(String),
}

pub struct ProgramSimulator<M: Model> {
    model: M,
    frames: Vec<Buffer>,
    command_log: Vec<CmdRecord>,
    logs: Vec<String>,
    size: Option<(u16, u16)>,
    running: bool,
}

impl<M: Model> ProgramSimulator<M> {
    /// The model is not initialized until [`init`](Self::init).
    pub fn new(model: M) -> Self {
        Self {
            model,
            frames: Vec::new(),
            command_log: Vec::new(),
            logs: Vec::new(),
            size: None,
            running: true,
        }
    }

    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute(cmd);
    }

    pub fn inject_events(&mut self, events: &[Event]) {
        for event in events {
            if !self.running {
                break;
            }
            self.send(M::Message::from(event.clone()));
        }
    }

    pub fn inject_event(&mut self, event: Event) {
        self.inject_events(&[event]);
    }

    /// Dispatch a message directly.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute(cmd);
    }

    /// Ids of the subscriptions the model currently declares.
    pub fn subscription_ids(&self) -> Vec<SubId> {
        self.model.subscriptions().iter().map(|s| s.id()).collect()
    }

    /// Fire each declared subscription once. Returns how many fired.
    pub fn tick_subscriptions(&mut self) -> usize {
        let messages: Vec<M::Message> = self
            .model
            .subscriptions()
            .iter()
            .filter_map(|s| s.sample())
            .collect();
        let fired = messages.len();
        for msg in messages {
            self.send(msg);
        }
        fired
    }

    /// Render at the given size and keep the result.
    pub fn capture_frame(&mut self, width: u16, height: u16) -> &Buffer {
        let frame = self.render(width, height);
        self.frames.push(frame.buffer);
        &self.frames[self.frames.len() - 1]
    }

    /// Render and return the whole frame, anchors included.
    pub fn render(&mut self, width: u16, height: u16) -> Frame {
        self.resize(width, height);
        let mut frame = Frame::new(width, height);
        self.model.view(&mut frame);
        frame
    }

    /// Size of the last render, if any.
    pub fn size(&self) -> Option<(u16, u16)> {
        self.size
    }

    fn resize(&mut self, width: u16, height: u16) {
        if self.size == Some((width, height)) {
            return;
        }
        self.size = Some((width, height));
        self.send(M::Message::from(Event::Resize { width, height }));
    }

    pub fn last_frame(&self) -> Option<&Buffer> {
        self.frames.last()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// `false` after a `Cmd::Quit`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// Names of every task executed so far, in order.
    pub fn task_names(&self) -> Vec<&str> {
        self.command_log
            .iter()
            .filter_map(|record| match record {
                CmdRecord::Task(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn execute(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => {
                self.running = false;
                self.command_log.push(CmdRecord::Quit);
            }
            Cmd::Msg(m) => {
                self.command_log.push(CmdRecord::Msg);
                let cmd = self.model.update(m);
                self.execute(cmd);
            }
            Cmd::Batch(cmds) => {
                self.command_log.push(CmdRecord::Batch(cmds.len()));
                for c in cmds {
                    self.execute(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Log(text) => {
                self.command_log.push(CmdRecord::Log(text.clone()));
                self.logs.push(text);
            }
            Cmd::Task(name, f) => {
                self.command_log.push(CmdRecord::Task(name));
                let msg = f();
                let cmd = self.model.update(msg);
                self.execute(cmd);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Style;
    use crate::subscription::{Every, Subscription};
    use evalboard_core::event::{KeyCode, KeyEvent};
    use std::time::Duration;

    struct Counter {
        value: i32,
        ticking: bool,
        resizes: Vec<(u16, u16)>,
    }

    #[derive(Debug)]
    enum Msg {
        Increment,
        Quit,
        StartTicking,
        Tick,
        Fetch,
        Fetched(i32),
        Resized(u16, u16),
        Ignore,
    }

    impl From<Event> for Msg {
        fn from(event: Event) -> Self {
            match event {
                Event::Key(k) if k.is_char('+') => Msg::Increment,
                Event::Key(k) if k.is_char('q') => Msg::Quit,
                Event::Key(k) if k.code == KeyCode::Enter => Msg::Fetch,
                Event::Resize { width, height } => Msg::Resized(width, height),
                _ => Msg::Ignore,
            }
        }
    }

    impl Model for Counter {
        type Message = Msg;

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            match msg {
                Msg::Increment => {
                    self.value += 1;
                    Cmd::log(format!("value={}", self.value))
                }
                Msg::Quit => Cmd::quit(),
                Msg::StartTicking => {
                    self.ticking = true;
                    Cmd::none()
                }
                Msg::Tick => {
                    self.value += 10;
                    Cmd::none()
                }
                Msg::Fetch => Cmd::task("fetch", || Msg::Fetched(42)),
                Msg::Fetched(v) => {
                    self.value = v;
                    Cmd::none()
                }
                Msg::Resized(width, height) => {
                    self.resizes.push((width, height));
                    Cmd::none()
                }
                Msg::Ignore => Cmd::none(),
            }
        }

        fn view(&self, frame: &mut Frame) {
            let area = frame.area();
            frame.print_in(area, &format!("value {}", self.value), Style::new());
        }

        fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
            if self.ticking {
                vec![Box::new(Every::with_id(1, Duration::from_secs(1), || Msg::Tick))]
            } else {
                vec![]
            }
        }
    }

    fn sim() -> ProgramSimulator<Counter> {
        let mut sim = ProgramSimulator::new(Counter {
            value: 0,
            ticking: false,
            resizes: Vec::new(),
        });
        sim.init();
        sim
    }

    #[test]
    fn events_flow_through_update() {
        let mut sim = sim();
        sim.inject_event(Event::Key(KeyEvent::char('+')));
        sim.inject_event(Event::Key(KeyEvent::char('+')));
        assert_eq!(sim.model().value, 2);
        assert_eq!(sim.logs(), ["value=1", "value=2"]);
    }

    #[test]
    fn quit_stops_processing() {
        let mut sim = sim();
        sim.inject_events(&[
            Event::Key(KeyEvent::char('q')),
            Event::Key(KeyEvent::char('+')),
        ]);
        assert!(!sim.is_running());
        assert_eq!(sim.model().value, 0);
    }

    #[test]
    fn tasks_run_synchronously() {
        let mut sim = sim();
        sim.inject_event(Event::Key(KeyEvent::new(KeyCode::Enter)));
        assert_eq!(sim.model().value, 42);
        assert_eq!(sim.task_names(), ["fetch"]);
    }

    #[test]
    fn subscriptions_fire_only_while_declared() {
        let mut sim = sim();
        assert_eq!(sim.tick_subscriptions(), 0);
        sim.send(Msg::StartTicking);
        assert_eq!(sim.subscription_ids(), vec![1]);
        assert_eq!(sim.tick_subscriptions(), 1);
        assert_eq!(sim.model().value, 10);
    }

    #[test]
    fn frames_are_captured() {
        let mut sim = sim();
        sim.send(Msg::Increment);
        let buf = sim.capture_frame(20, 2);
        assert!(buf.contains_text("value 1"));
        assert_eq!(sim.frame_count(), 1);
    }

    #[test]
    fn rendering_at_a_new_size_reports_it_once() {
        let mut sim = sim();
        assert_eq!(sim.size(), None);
        sim.capture_frame(20, 2);
        sim.render(20, 2);
        sim.render(40, 5);
        assert_eq!(sim.model().resizes, vec![(20, 2), (40, 5)]);
        assert_eq!(sim.size(), Some((40, 5)));
    }
}
