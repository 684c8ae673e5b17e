//! Property tests for the pacing state machine
//!
//! Random sequences and intervals; the invariants hold regardless of input
//! shape: every element is delivered exactly once in order, progress grows
//! by one per call, stop drains the tail, kill delivers nothing further.

mod common;

use cadence::{ManualClock, Pacer};
use common::Recorder;
use proptest::prelude::*;

fn paced_run(
    clock: &ManualClock,
    recorder: &Recorder<i32>,
    elements: Vec<i32>,
    interval: f64,
) -> Pacer<i32> {
    Pacer::builder(elements)
        .interval(interval)
        .on_each(recorder.each_fn())
        .on_complete(recorder.complete_fn())
        .schedule_with(clock.schedule_fn())
        .cancel_with(clock.cancel_fn())
        .start()
        .expect("pacer starts")
}

proptest! {
    #[test]
    fn every_element_is_delivered_once_in_order(
        elements in proptest::collection::vec(any::<i32>(), 0..40),
        interval in 0.001f64..60.0,
    ) {
        let clock = ManualClock::new();
        let recorder = Recorder::new();
        let pacer = paced_run(&clock, &recorder, elements.clone(), interval);

        // one advance per remaining element, plus one for completion
        for _ in 0..=elements.len() {
            clock.advance(interval);
        }

        prop_assert!(pacer.is_finished());
        prop_assert_eq!(recorder.elements(), elements.clone());

        for (position, call) in recorder.calls().iter().enumerate() {
            prop_assert_eq!(call.index, position, "indices must be sequential");
            prop_assert_eq!(
                call.progress.len(),
                position + 1,
                "progress length must equal the 1-based call position"
            );
            prop_assert_eq!(&call.progress[..], &elements[..=position]);
        }

        let completion = recorder.completion().expect("run completes");
        prop_assert_eq!(completion.progress, elements);
        prop_assert!(!completion.user_stopped);
    }

    #[test]
    fn zero_interval_drains_entirely_at_construction(
        elements in proptest::collection::vec(any::<i32>(), 0..40),
    ) {
        let clock = ManualClock::new();
        let recorder = Recorder::new();
        let pacer = paced_run(&clock, &recorder, elements.clone(), 0.0);

        prop_assert!(pacer.is_finished());
        prop_assert_eq!(recorder.elements(), elements);
        prop_assert!(recorder.completion().is_some());
        prop_assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn stop_after_k_steps_delivers_the_rest_synchronously(
        elements in proptest::collection::vec(any::<i32>(), 1..40),
        k_seed in any::<usize>(),
    ) {
        let k = 1 + k_seed % elements.len();
        let clock = ManualClock::new();
        let recorder = Recorder::new();
        let pacer = paced_run(&clock, &recorder, elements.clone(), 1.0);

        // the first step fired at construction; reach K steps total
        for _ in 0..k - 1 {
            clock.advance(1.0);
        }
        prop_assert_eq!(recorder.call_count(), k);

        pacer.stop();

        prop_assert_eq!(recorder.elements(), elements.clone());
        let completion = recorder.completion().expect("stop completes the run");
        prop_assert_eq!(completion.progress, elements);
        prop_assert!(completion.user_stopped);
    }

    #[test]
    fn kill_after_k_steps_delivers_nothing_further(
        elements in proptest::collection::vec(any::<i32>(), 1..40),
        k_seed in any::<usize>(),
    ) {
        let k = 1 + k_seed % elements.len();
        let clock = ManualClock::new();
        let recorder = Recorder::new();
        let pacer = paced_run(&clock, &recorder, elements.clone(), 1.0);

        for _ in 0..k - 1 {
            clock.advance(1.0);
        }
        prop_assert_eq!(recorder.call_count(), k);

        pacer.kill();
        clock.advance(elements.len() as f64 + 1.0);

        prop_assert_eq!(recorder.call_count(), k);
        prop_assert_eq!(recorder.elements(), elements[..k].to_vec());
        prop_assert!(recorder.completion().is_none(), "killed runs never complete");
    }
}
