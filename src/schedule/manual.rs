//! Virtual-time scheduler
//!
//! Deterministic stand-in for [`WallClock`](super::WallClock): time only
//! moves when [`ManualClock::advance`] is called, which fires due callbacks
//! in deadline order without ever sleeping.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::{CancelFn, ScheduleFn, TimerCallback, TimerId};

/// Virtual-time scheduler for deterministic tests and demos.
pub struct ManualClock {
    inner: Rc<RefCell<Queue>>,
}

struct Entry {
    id: u64,
    deadline: f64,
    callback: TimerCallback,
}

struct Queue {
    now: f64,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Queue {
    /// Index of the earliest entry due at or before `target`; ties fire in
    /// schedule order.
    fn due_index(&self, target: f64) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline <= target)
            .min_by(|(_, a), (_, b)| a.deadline.total_cmp(&b.deadline).then(a.id.cmp(&b.id)))
            .map(|(index, _)| index)
    }
}

impl ManualClock {
    /// Create a clock at virtual time zero with no timers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Queue {
                now: 0.0,
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Scheduling half of the timer pair. Deadlines are relative to the
    /// virtual now.
    pub fn schedule_fn(&self) -> ScheduleFn {
        let inner = Rc::clone(&self.inner);
        Box::new(move |callback, delay_seconds| {
            let mut queue = inner.borrow_mut();
            let id = queue.next_id;
            queue.next_id += 1;
            let deadline = queue.now + delay_seconds.max(0.0);
            queue.entries.push(Entry {
                id,
                deadline,
                callback,
            });
            trace!(id, deadline, "virtual timer scheduled");
            TimerId::new(id)
        })
    }

    /// Cancelling half of the timer pair. Stale ids are ignored.
    pub fn cancel_fn(&self) -> CancelFn {
        let inner = Rc::clone(&self.inner);
        Box::new(move |id| {
            inner
                .borrow_mut()
                .entries
                .retain(|entry| entry.id != id.raw());
        })
    }

    /// Current virtual time in seconds.
    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    /// Number of live timers.
    pub fn pending(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Advance virtual time by `seconds`, firing every callback whose
    /// deadline falls inside the window, in deadline order. Fired callbacks
    /// may schedule new timers; those fire too if they land inside the
    /// window.
    pub fn advance(&self, seconds: f64) {
        let target = self.inner.borrow().now + seconds.max(0.0);
        loop {
            let due = {
                let mut queue = self.inner.borrow_mut();
                match queue.due_index(target) {
                    None => {
                        queue.now = target;
                        None
                    }
                    Some(index) => {
                        let entry = queue.entries.remove(index);
                        queue.now = queue.now.max(entry.deadline);
                        trace!(id = entry.id, now = queue.now, "virtual timer fired");
                        Some(entry.callback)
                    }
                }
            };
            match due {
                None => break,
                Some(callback) => callback(),
            }
        }
    }

    /// Jump straight to the next scheduled deadline and fire exactly one
    /// callback. Returns false when nothing is pending.
    pub fn fire_next(&self) -> bool {
        let due = {
            let mut queue = self.inner.borrow_mut();
            match queue.due_index(f64::INFINITY) {
                None => None,
                Some(index) => {
                    let entry = queue.entries.remove(index);
                    queue.now = queue.now.max(entry.deadline);
                    Some(entry.callback)
                }
            }
        };
        match due {
            None => false,
            Some(callback) => {
                callback();
                true
            }
        }
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.inner.borrow();
        f.debug_struct("ManualClock")
            .field("now", &queue.now)
            .field("pending", &queue.entries.len())
            .finish()
    }
}
