//! # cadence — timer-driven sequence iteration
//!
//! Walks an ordered sequence, invoking a per-element handler with a
//! configurable delay between steps, and a completion handler once when the
//! sequence is exhausted or the run is terminated through the handle.
//!
//! The delay machinery is injectable: scheduling goes through a
//! schedule/cancel function pair that defaults to a wall-clock timer and can
//! be replaced wholesale, e.g. with [`ManualClock`] for deterministic tests.
//!
//! ## Usage Example
//!
//! ```
//! use cadence::{ManualClock, Pacer};
//!
//! let clock = ManualClock::new();
//! let pacer = Pacer::builder(vec![2, 4, 9, 16, 25])
//!     .interval(1.0)
//!     .on_each(|n, index, _progress, _interval| println!("step {index}: {n}"))
//!     .on_complete(|progress, _user_stopped| println!("{} steps done", progress.len()))
//!     .schedule_with(clock.schedule_fn())
//!     .cancel_with(clock.cancel_fn())
//!     .start()?;
//!
//! clock.advance(5.0);
//! assert!(pacer.is_finished());
//! # Ok::<(), cadence::CadenceError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod pacer;    // Delayed-iteration state machine
pub mod schedule; // Injectable scheduling primitive

// Re-exports for convenience
pub use pacer::{Pacer, PacerBuilder};
pub use schedule::{CancelFn, ManualClock, ScheduleFn, TimerCallback, TimerId, WallClock};

use thiserror::Error;

/// Errors raised while constructing a [`Pacer`]
#[derive(Error, Debug)]
pub enum CadenceError {
    /// Exactly one half of the schedule/cancel timer pair was supplied
    #[error("both schedule and cancel functions must be set, or neither")]
    PartialTimerOverride,

    /// A negative (or non-finite) interval was supplied at construction
    #[error("interval must be a non-negative number of seconds, got {0}")]
    NegativeInterval(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn zero_interval_drains_synchronously_at_construction() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let pacer = Pacer::builder(vec![1, 2, 3])
            .on_each(move |n, _index, _progress, _interval| sink.borrow_mut().push(*n))
            .start()
            .unwrap();

        assert!(pacer.is_finished());
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn partial_timer_override_is_rejected() {
        let err = Pacer::builder(vec![1])
            .schedule_with(|_callback, _delay| TimerId::new(0))
            .start()
            .unwrap_err();

        assert!(matches!(err, CadenceError::PartialTimerOverride));
    }
}
