//! Construction and validation for [`Pacer`] runs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::schedule::{CancelFn, ScheduleFn, TimerCallback, TimerId, WallClock};
use crate::CadenceError;

use super::{advance_callback, drive, CompleteFn, Core, EachFn, Pacer};

/// Fluent builder for a [`Pacer`] run.
///
/// The run begins inside [`start`](Self::start): instantly by default, or
/// after one scheduled delay with [`instant(false)`](Self::instant).
pub struct PacerBuilder<T> {
    elements: VecDeque<T>,
    interval: f64,
    instant: bool,
    on_each: Option<EachFn<T>>,
    on_complete: Option<CompleteFn<T>>,
    schedule: Option<ScheduleFn>,
    cancel: Option<CancelFn>,
}

impl<T: Clone + 'static> PacerBuilder<T> {
    pub(super) fn new(elements: impl IntoIterator<Item = T>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            interval: 0.0,
            instant: true,
            on_each: None,
            on_complete: None,
            schedule: None,
            cancel: None,
        }
    }

    /// Delay between steps, in seconds (fractional allowed). Defaults to
    /// zero, meaning the whole sequence drains synchronously.
    pub fn interval(mut self, seconds: f64) -> Self {
        self.interval = seconds;
        self
    }

    /// Whether the first step fires synchronously inside
    /// [`start`](Self::start) (default) or after one interval-length delay.
    /// A zero-length delay still goes through the scheduler.
    pub fn instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    /// Handler invoked once per element, in sequence order. Optional: when
    /// omitted, elements are consumed without notification.
    pub fn on_each(mut self, handler: impl FnMut(&T, usize, &[T], f64) + 'static) -> Self {
        self.on_each = Some(Box::new(handler));
        self
    }

    /// Handler invoked at most once when the run ends. Optional: when
    /// omitted, completion is silent and the progress is discarded.
    pub fn on_complete(mut self, handler: impl FnOnce(&[T], bool) + 'static) -> Self {
        self.on_complete = Some(Box::new(handler));
        self
    }

    /// Override the scheduling half of the timer pair. Must be supplied
    /// together with [`cancel_with`](Self::cancel_with).
    pub fn schedule_with(
        mut self,
        schedule: impl FnMut(TimerCallback, f64) -> TimerId + 'static,
    ) -> Self {
        self.schedule = Some(Box::new(schedule));
        self
    }

    /// Override the cancelling half of the timer pair. Must be supplied
    /// together with [`schedule_with`](Self::schedule_with).
    pub fn cancel_with(mut self, cancel: impl FnMut(TimerId) + 'static) -> Self {
        self.cancel = Some(Box::new(cancel));
        self
    }

    /// Validate the configuration and begin the run.
    ///
    /// Fails fast — before any element is processed — when a negative
    /// interval was supplied, or when exactly one half of the timer pair
    /// was overridden.
    pub fn start(self) -> Result<Pacer<T>, CadenceError> {
        if self.interval < 0.0 || self.interval.is_nan() {
            return Err(CadenceError::NegativeInterval(self.interval));
        }

        let (schedule, cancel, clock) = match (self.schedule, self.cancel) {
            (Some(schedule), Some(cancel)) => (schedule, cancel, None),
            (None, None) => {
                let clock = WallClock::new();
                (clock.schedule_fn(), clock.cancel_fn(), Some(clock))
            }
            _ => return Err(CadenceError::PartialTimerOverride),
        };

        let interval = self.interval;
        let core = Rc::new(RefCell::new(Core {
            remaining: self.elements,
            progress: Vec::new(),
            interval,
            pending: None,
            user_stopped: false,
            finished: false,
            advancing: false,
            on_each: self.on_each,
            on_complete: self.on_complete,
            schedule,
            cancel,
        }));

        if self.instant {
            drive(&core);
        } else {
            let mut c = core.borrow_mut();
            let next = advance_callback(&core);
            let id = (c.schedule)(next, interval);
            c.pending = Some(id);
        }

        Ok(Pacer {
            core,
            interval,
            clock,
        })
    }
}

impl<T> fmt::Debug for PacerBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacerBuilder")
            .field("elements", &self.elements.len())
            .field("interval", &self.interval)
            .field("instant", &self.instant)
            .field("has_on_each", &self.on_each.is_some())
            .field("has_on_complete", &self.on_complete.is_some())
            .finish()
    }
}
