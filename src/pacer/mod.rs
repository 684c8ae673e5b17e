//! Delayed-iteration state machine
//!
//! [`Pacer`] walks an ordered sequence, invoking a per-element handler with a
//! configurable delay between steps and a completion handler when the
//! sequence is exhausted or the run is terminated through the handle.
//!
//! The core state lives behind `Rc<RefCell<...>>`, shared between the handle
//! and the callbacks handed to the scheduler. Handlers are always invoked
//! with no borrow held, so user code may call handle operations from inside
//! a handler; an in-flight advance picks such changes up at its next step
//! boundary, which keeps the at-most-one-pending-timer invariant intact.

mod builder;

pub use builder::PacerBuilder;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::schedule::{CancelFn, ScheduleFn, TimerCallback, TimerId, WallClock};

/// Per-element handler: the element, its zero-based index in the original
/// sequence, a snapshot of the progress so far (including the current
/// element), and the interval in effect when the step ran.
pub type EachFn<T> = Box<dyn FnMut(&T, usize, &[T], f64)>;

/// Completion handler: the accumulated progress and whether the run was cut
/// short through [`Pacer::stop`] (true) or exhausted naturally (false).
pub type CompleteFn<T> = Box<dyn FnOnce(&[T], bool)>;

/// Mutable state of one run. Owned jointly by the handle and by the advance
/// callbacks handed to the scheduler.
struct Core<T> {
    remaining: VecDeque<T>,
    progress: Vec<T>,
    interval: f64,
    /// At most one outstanding scheduled callback per instance.
    pending: Option<TimerId>,
    user_stopped: bool,
    /// Set exactly once, when the completion handler has fired or would
    /// fire; turns every later operation into a no-op.
    finished: bool,
    /// True while an advance loop is on the stack.
    advancing: bool,
    on_each: Option<EachFn<T>>,
    on_complete: Option<CompleteFn<T>>,
    schedule: ScheduleFn,
    cancel: CancelFn,
}

/// Handle to a running delayed iteration.
///
/// Created through [`Pacer::builder`]; the run begins inside
/// [`PacerBuilder::start`], either synchronously (instant mode) or after one
/// scheduled delay.
pub struct Pacer<T> {
    core: Rc<RefCell<Core<T>>>,
    /// Interval at handle creation; deliberately not live.
    interval: f64,
    clock: Option<WallClock>,
}

impl<T: Clone + 'static> Pacer<T> {
    /// Start describing a run over `elements`. The elements are collected
    /// up front, so later mutation of the source is invisible to the run.
    pub fn builder(elements: impl IntoIterator<Item = T>) -> PacerBuilder<T> {
        PacerBuilder::new(elements)
    }

    /// Replace the delay between steps.
    ///
    /// Cancels any pending timer first, so two advances can never race. A
    /// positive value schedules the next advance after that delay; zero
    /// advances immediately and keeps advancing synchronously until the
    /// sequence ends or the interval is changed away from zero. Negative
    /// values are treated as zero. No-op once the run has finished.
    ///
    /// When called from inside a handler, only the stored interval changes;
    /// the advance already on the stack applies it at the next step
    /// boundary.
    pub fn set_interval(&self, seconds: f64) {
        let seconds = seconds.max(0.0);
        {
            let mut core = self.core.borrow_mut();
            if core.finished {
                return;
            }
            if let Some(id) = core.pending.take() {
                (core.cancel)(id);
            }
            core.interval = seconds;
            if core.advancing {
                return;
            }
            if seconds > 0.0 {
                let next = advance_callback(&self.core);
                let id = (core.schedule)(next, seconds);
                core.pending = Some(id);
                return;
            }
        }
        drive(&self.core);
    }

    /// Finish the run now: the remaining elements are delivered to the
    /// per-element handler synchronously, in order, then the completion
    /// handler fires once with `user_stopped = true`. No-op once finished.
    pub fn stop(&self) {
        {
            let mut core = self.core.borrow_mut();
            if core.finished {
                return;
            }
            core.user_stopped = true;
        }
        self.set_interval(0.0);
    }

    /// Abort the run silently: the pending timer is cancelled, no further
    /// elements are delivered, and the completion handler never fires.
    /// During a zero-interval synchronous burst this takes effect at the
    /// next step boundary. No-op once finished.
    pub fn kill(&self) {
        let mut core = self.core.borrow_mut();
        if core.finished {
            return;
        }
        core.finished = true;
        if let Some(id) = core.pending.take() {
            (core.cancel)(id);
        }
        core.on_complete = None;
        debug!(processed = core.progress.len(), "run killed");
    }

    /// The interval the run started with. A snapshot taken when the handle
    /// was created; it does not track later [`set_interval`](Self::set_interval)
    /// calls.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Whether the run has ended, by exhaustion, stop, or kill.
    pub fn is_finished(&self) -> bool {
        self.core.borrow().finished
    }

    /// Drive the default wall-clock scheduler until no timers remain,
    /// sleeping between deadlines. No-op when a custom scheduling pair was
    /// injected — then the caller drives.
    pub fn run_until_idle(&self) {
        if let Some(clock) = &self.clock {
            clock.run_until_idle();
        }
    }
}

impl<T> fmt::Debug for Pacer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.core.try_borrow() {
            Ok(core) => f
                .debug_struct("Pacer")
                .field("interval", &self.interval)
                .field("remaining", &core.remaining.len())
                .field("finished", &core.finished)
                .finish(),
            Err(_) => f
                .debug_struct("Pacer")
                .field("interval", &self.interval)
                .field("state", &"<advancing>")
                .finish(),
        }
    }
}

/// Outcome of one advance step, computed under a short borrow so handlers
/// run with the core unlocked.
enum Step<T> {
    /// An element was consumed; invoke the handler, then decide what's next.
    Fire {
        handler: Option<EachFn<T>>,
        index: usize,
        snapshot: Vec<T>,
        interval: f64,
    },
    /// The queue is empty; fire completion once.
    Complete {
        handler: Option<CompleteFn<T>>,
        progress: Vec<T>,
        user_stopped: bool,
    },
    /// The run ended while the loop was parked.
    Halt,
}

/// Run advance steps until the sequence ends, the run is terminated, or a
/// positive interval schedules the next advance.
fn drive<T: Clone + 'static>(core: &Rc<RefCell<Core<T>>>) {
    {
        let mut c = core.borrow_mut();
        // a timer that fired is no longer pending
        c.pending = None;
        if c.finished || c.advancing {
            return;
        }
        c.advancing = true;
    }

    loop {
        match next_step(core) {
            Step::Halt => break,
            Step::Complete {
                handler,
                progress,
                user_stopped,
            } => {
                debug!(steps = progress.len(), user_stopped, "run complete");
                if let Some(handler) = handler {
                    handler(&progress, user_stopped);
                }
                break;
            }
            Step::Fire {
                mut handler,
                index,
                snapshot,
                interval,
            } => {
                trace!(index, interval, "dispatching element");
                if let Some(each) = handler.as_mut() {
                    each(&snapshot[index], index, &snapshot, interval);
                }
                if !after_fire(core, handler) {
                    break;
                }
            }
        }
    }

    core.borrow_mut().advancing = false;
}

/// Consume the next element (or detect completion) under a short borrow.
fn next_step<T: Clone>(core: &Rc<RefCell<Core<T>>>) -> Step<T> {
    let mut c = core.borrow_mut();
    if c.finished {
        return Step::Halt;
    }
    match c.remaining.pop_front() {
        None => {
            c.finished = true;
            Step::Complete {
                handler: c.on_complete.take(),
                progress: std::mem::take(&mut c.progress),
                user_stopped: c.user_stopped,
            }
        }
        Some(element) => {
            c.progress.push(element);
            let index = c.progress.len() - 1;
            Step::Fire {
                handler: c.on_each.take(),
                index,
                snapshot: c.progress.clone(),
                interval: c.interval,
            }
        }
    }
}

/// Restore the handler and decide how to continue after a step. Returns
/// true when the loop should advance again synchronously.
fn after_fire<T: Clone + 'static>(core: &Rc<RefCell<Core<T>>>, handler: Option<EachFn<T>>) -> bool {
    let mut c = core.borrow_mut();
    c.on_each = handler;
    if c.finished {
        // killed from inside the handler
        return false;
    }
    if c.interval > 0.0 {
        let next = advance_callback(core);
        let interval = c.interval;
        let id = (c.schedule)(next, interval);
        c.pending = Some(id);
        return false;
    }
    true
}

/// A scheduler callback that re-enters the advance loop.
fn advance_callback<T: Clone + 'static>(core: &Rc<RefCell<Core<T>>>) -> TimerCallback {
    let core = Rc::clone(core);
    Box::new(move || drive(&core))
}
