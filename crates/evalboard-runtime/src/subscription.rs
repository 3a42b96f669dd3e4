#![forbid(unsafe_code)]

//! Subscriptions: continuous message sources owned by the runtime.
//!
//! A model declares what it wants to hear from in `Model::subscriptions()`.
//! After every update the runtime reconciles that list against what is
//! running: new ids are started on a background thread, ids that vanished are
//! stopped. Dropping a [`RunningSubscription`] trips its stop signal, so a
//! timer can never outlive the view state that asked for it.

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, mpsc};
use std::thread;
use std::time::{Duration, Instant};

/// Identifier used to match declarations across update cycles.
pub type SubId = u64;

/// A message source that runs on its own thread until stopped.
pub trait Subscription<M: Send + 'static>: Send {
    /// Subscriptions with equal ids are treated as the same subscription.
    fn id(&self) -> SubId;

    /// Send messages until `stop` trips or the receiver goes away.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);

    /// One message as if the source had fired once.
    ///
    /// Used by the headless simulator to drive timers deterministically.
    fn sample(&self) -> Option<M> {
        None
    }
}

type StopState = Arc<(Mutex<bool>, Condvar)>;

fn lock_stopped(state: &StopState) -> MutexGuard<'_, bool> {
    state.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Checked by a running subscription to learn it should exit.
#[derive(Clone)]
pub struct StopSignal {
    inner: StopState,
}

impl StopSignal {
    pub(crate) fn new() -> (Self, StopTrigger) {
        let inner: StopState = Arc::new((Mutex::new(false), Condvar::new()));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            StopTrigger { inner },
        )
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *lock_stopped(&self.inner)
    }

    /// Block until stopped or `duration` passes. Returns `true` if stopped.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let cvar = &self.inner.1;
        let mut stopped = lock_stopped(&self.inner);
        let start = Instant::now();
        loop {
            if *stopped {
                return true;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            let (guard, _) = cvar
                .wait_timeout(stopped, duration - elapsed)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            stopped = guard;
        }
    }
}

/// Runtime-side handle that trips a [`StopSignal`].
pub(crate) struct StopTrigger {
    inner: StopState,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        *lock_stopped(&self.inner) = true;
        self.inner.1.notify_all();
    }
}

pub(crate) struct RunningSubscription {
    pub(crate) id: SubId,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningSubscription {
    /// Stop and join.
    pub(crate) fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RunningSubscription {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

/// Owns the running subscriptions of one program.
pub(crate) struct SubscriptionManager<M: Send + 'static> {
    active: Vec<RunningSubscription>,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M: Send + 'static> SubscriptionManager<M> {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            active: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Start newly declared ids, stop the ones no longer declared.
    pub(crate) fn reconcile(&mut self, subscriptions: Vec<Box<dyn Subscription<M>>>) {
        let wanted: HashSet<SubId> = subscriptions.iter().map(|s| s.id()).collect();
        let before = self.active.len();

        let mut remaining = Vec::with_capacity(self.active.len());
        for running in self.active.drain(..) {
            if wanted.contains(&running.id) {
                remaining.push(running);
            } else {
                tracing::debug!(target: "evalboard.subscription", sub_id = running.id, "stopping subscription");
                running.stop();
            }
        }
        self.active = remaining;

        let mut active_ids: HashSet<SubId> = self.active.iter().map(|r| r.id).collect();
        for sub in subscriptions {
            let id = sub.id();
            if !active_ids.insert(id) {
                continue;
            }
            tracing::debug!(target: "evalboard.subscription", sub_id = id, "starting subscription");
            let (signal, trigger) = StopSignal::new();
            let sender = self.sender.clone();
            let thread = thread::spawn(move || sub.run(sender, signal));
            self.active.push(RunningSubscription {
                id,
                trigger,
                thread: Some(thread),
            });
        }

        if before != self.active.len() {
            tracing::trace!(
                target: "evalboard.subscription",
                before,
                after = self.active.len(),
                "subscriptions reconciled"
            );
        }
    }

    pub(crate) fn drain_messages(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    pub(crate) fn active_ids(&self) -> Vec<SubId> {
        self.active.iter().map(|r| r.id).collect()
    }

    pub(crate) fn stop_all(&mut self) {
        for running in self.active.drain(..) {
            running.stop();
        }
    }
}

impl<M: Send + 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// ---------------------------------------------------------------------------
// Built-in subscriptions
// ---------------------------------------------------------------------------

/// Fires a message at a fixed interval.
///
/// ```ignore
/// fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
///     vec![Box::new(Every::with_id(CAPTURE_TIMER, Duration::from_millis(800), || Msg::CaptureTick))]
/// }
/// ```
pub struct Every<M: Send + 'static> {
    id: SubId,
    interval: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Every<M> {
    /// Id derived from the interval, so equal intervals dedupe.
    pub fn new(interval: Duration, make_msg: impl Fn() -> M + Send + Sync + 'static) -> Self {
        let id = interval.as_nanos() as u64 ^ 0x4556_4552_5900; // "EVERY"
        Self::with_id(id, interval, make_msg)
    }

    pub fn with_id(
        id: SubId,
        interval: Duration,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            interval,
            make_msg: Box::new(make_msg),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<M: Send + 'static> Subscription<M> for Every<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        let mut ticks: u64 = 0;
        while !stop.wait_timeout(self.interval) {
            ticks += 1;
            if sender.send((self.make_msg)()).is_err() {
                break;
            }
        }
        tracing::trace!(target: "evalboard.subscription", sub_id = self.id, ticks, "interval stopped");
    }

    fn sample(&self) -> Option<M> {
        Some((self.make_msg)())
    }
}
