//! Wall-clock scheduler
//!
//! The default timer pair, backed by real time. Timers live in a
//! deadline-ordered heap; [`WallClock::run_until_idle`] sleeps to each
//! earliest live deadline and fires its callback.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::trace;

use super::{CancelFn, ScheduleFn, TimerCallback, TimerId};

/// Upper bound on a single scheduled delay (one year).
const MAX_DELAY: Duration = Duration::from_secs(86_400 * 365);

/// Real-time scheduler driving callbacks from a blocking run loop.
///
/// Cancellation removes the callback and leaves a stale heap entry behind;
/// stale entries are skipped when popped.
pub struct WallClock {
    inner: Rc<RefCell<Queue>>,
}

struct Queue {
    next_id: u64,
    deadlines: BinaryHeap<Reverse<(Instant, u64)>>,
    callbacks: HashMap<u64, TimerCallback>,
}

impl WallClock {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Queue {
                next_id: 0,
                deadlines: BinaryHeap::new(),
                callbacks: HashMap::new(),
            })),
        }
    }

    /// Scheduling half of the timer pair.
    pub fn schedule_fn(&self) -> ScheduleFn {
        let inner = Rc::clone(&self.inner);
        Box::new(move |callback, delay_seconds| {
            let mut queue = inner.borrow_mut();
            let id = queue.next_id;
            queue.next_id += 1;
            // cap non-finite and oversized delays
            let delay = Duration::try_from_secs_f64(delay_seconds.max(0.0))
                .unwrap_or(MAX_DELAY)
                .min(MAX_DELAY);
            let deadline = Instant::now() + delay;
            queue.deadlines.push(Reverse((deadline, id)));
            queue.callbacks.insert(id, callback);
            trace!(id, delay_seconds, "wall timer scheduled");
            TimerId::new(id)
        })
    }

    /// Cancelling half of the timer pair. Stale ids are ignored.
    pub fn cancel_fn(&self) -> CancelFn {
        let inner = Rc::clone(&self.inner);
        Box::new(move |id| {
            if inner.borrow_mut().callbacks.remove(&id.raw()).is_some() {
                trace!(id = id.raw(), "wall timer cancelled");
            }
        })
    }

    /// Number of live (not yet fired or cancelled) timers.
    pub fn pending(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    /// Sleep to each earliest live deadline and fire its callback, until no
    /// live timers remain. Fired callbacks may schedule further timers; those
    /// are driven too.
    pub fn run_until_idle(&self) {
        loop {
            let due = {
                let mut queue = self.inner.borrow_mut();
                loop {
                    match queue.deadlines.pop() {
                        None => break None,
                        Some(Reverse((deadline, id))) => {
                            if queue.callbacks.contains_key(&id) {
                                break Some((deadline, id));
                            }
                            // cancelled; skip the stale entry
                        }
                    }
                }
            };
            let Some((deadline, id)) = due else { return };

            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }

            let callback = self.inner.borrow_mut().callbacks.remove(&id);
            if let Some(callback) = callback {
                trace!(id, "wall timer fired");
                callback();
            }
        }
    }
}

impl fmt::Debug for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WallClock")
            .field("pending", &self.pending())
            .finish()
    }
}
