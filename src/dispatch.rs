//! Per-thread run queue for continuation dispatch.
//!
//! Settling a promise from inside a handler queues the new work instead of
//! running it on top of the current handler, so a chain of any length is
//! dispatched in a loop rather than a recursion. A panicking job does not
//! stop the queue; the first panic is raised again once the queue is empty.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

pub(crate) type Job = Box<dyn FnOnce()>;

thread_local! {
    static QUEUE: RefCell<Option<VecDeque<Job>>> = const { RefCell::new(None) };
}

/// Runs `jobs` in order after whatever this thread is already dispatching.
/// Returns once the queue is empty if this call started it.
pub(crate) fn run<I>(jobs: I)
where
    I: IntoIterator<Item = Job>,
{
    let mut jobs = Some(jobs);
    let started = QUEUE.try_with(|queue| {
        let mut queue = queue.borrow_mut();
        let jobs = jobs.take().into_iter().flatten();
        match queue.as_mut() {
            Some(pending) => {
                pending.extend(jobs);
                false
            }
            None => {
                *queue = Some(jobs.collect());
                true
            }
        }
    });
    match started {
        Ok(true) => drain(),
        Ok(false) => {}
        // Thread-local storage is gone during thread teardown.
        Err(_) => {
            for job in jobs.into_iter().flatten() {
                job()
            }
        }
    }
}

fn drain() {
    let mut first_panic = None;
    while let Some(job) = next() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            first_panic.get_or_insert(payload);
        }
    }
    let _ = QUEUE.try_with(|queue| queue.borrow_mut().take());
    if let Some(payload) = first_panic {
        panic::resume_unwind(payload)
    }
}

fn next() -> Option<Job> {
    QUEUE
        .try_with(|queue| queue.borrow_mut().as_mut().and_then(VecDeque::pop_front))
        .ok()
        .flatten()
}
