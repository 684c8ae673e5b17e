//! Shared helpers for pacing integration tests
//!
//! `Recorder` captures the full callback trace of a run so tests can assert
//! on call order, indices, progress snapshots, and completion.

use std::cell::RefCell;
use std::rc::Rc;

/// One recorded per-element call.
#[derive(Debug, Clone, PartialEq)]
pub struct EachCall<T> {
    pub element: T,
    pub index: usize,
    pub progress: Vec<T>,
    pub interval: f64,
}

/// Recorded completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion<T> {
    pub progress: Vec<T>,
    pub user_stopped: bool,
}

/// Captures the full callback trace of a run.
pub struct Recorder<T> {
    inner: Rc<RefCell<Trace<T>>>,
}

struct Trace<T> {
    calls: Vec<EachCall<T>>,
    completion: Option<Completion<T>>,
}

impl<T: Clone + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Trace {
                calls: Vec::new(),
                completion: None,
            })),
        }
    }

    /// Per-element handler that appends to the trace.
    pub fn each_fn(&self) -> impl FnMut(&T, usize, &[T], f64) + 'static {
        let inner = Rc::clone(&self.inner);
        move |element: &T, index: usize, progress: &[T], interval: f64| {
            inner.borrow_mut().calls.push(EachCall {
                element: element.clone(),
                index,
                progress: progress.to_vec(),
                interval,
            });
        }
    }

    /// Completion handler that records progress and the stop flag.
    pub fn complete_fn(&self) -> impl FnOnce(&[T], bool) + 'static {
        let inner = Rc::clone(&self.inner);
        move |progress: &[T], user_stopped: bool| {
            let mut trace = inner.borrow_mut();
            assert!(trace.completion.is_none(), "completion fired twice");
            trace.completion = Some(Completion {
                progress: progress.to_vec(),
                user_stopped,
            });
        }
    }

    pub fn calls(&self) -> Vec<EachCall<T>> {
        self.inner.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.borrow().calls.len()
    }

    pub fn elements(&self) -> Vec<T> {
        self.inner
            .borrow()
            .calls
            .iter()
            .map(|call| call.element.clone())
            .collect()
    }

    pub fn completion(&self) -> Option<Completion<T>> {
        self.inner.borrow().completion.clone()
    }
}
