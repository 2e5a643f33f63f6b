#![forbid(unsafe_code)]

//! Batched update scheduler.
//!
//! Mutations never re-run watchers directly (sync watchers excepted): they
//! push the invalidated watcher onto a thread-local queue, deduplicated by
//! watcher id. [`flush`] drains the queue in ascending id order, so watchers
//! constructed earlier (e.g. a parent component's render effect) run before
//! those constructed later.
//!
//! There is no ambient event loop here; the host drives ticks explicitly by
//! calling [`flush`]. [`next_tick`] registers a callback to run at the end of
//! the next flush, after every queued watcher and every post-run hook.
//!
//! # Invariants
//!
//! 1. A watcher id appears at most once in the pending queue.
//! 2. Watchers queued mid-flush are spliced into the not-yet-run region at
//!    their sorted position and run in the same flush.
//! 3. A watcher that re-queues itself more than [`MAX_UPDATE_COUNT`] times in
//!    one flush is dropped from that flush and reported, so a circular update
//!    cannot hang the thread.
//! 4. A panic inside a watcher propagates to the [`flush`] caller, but only
//!    after the flush state resets: not-yet-run watchers stay queued for the
//!    next flush, and the scheduler never stays marked flushing.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};

use crate::dep::{Subscriber, WatcherId};
use crate::error::ReactiveError;

/// How many times a single watcher may be re-queued within one flush before
/// the scheduler declares a circular update and drops it.
pub const MAX_UPDATE_COUNT: u32 = 100;

#[derive(Default)]
struct SchedulerState {
    queue: Vec<Rc<dyn Subscriber>>,
    has: AHashSet<WatcherId>,
    circular: AHashMap<WatcherId, u32>,
    loop_reports: Vec<WatcherId>,
    callbacks: Vec<Box<dyn FnOnce()>>,
    flushing: bool,
    /// Index of the next queue slot to run; also the lower bound for
    /// mid-flush sorted inserts.
    index: usize,
}

thread_local! {
    static SCHEDULER: RefCell<SchedulerState> = RefCell::new(SchedulerState::default());
}

/// Enqueue a watcher for the next flush. Deduplicated by id. When called
/// during a flush, the watcher is spliced into the unprocessed tail at its
/// sorted position and runs in the same flush.
pub(crate) fn queue_watcher(watcher: Rc<dyn Subscriber>) {
    SCHEDULER.with(|s| {
        let mut st = s.borrow_mut();
        let id = watcher.id();
        if st.has.contains(&id) {
            return;
        }
        st.has.insert(id);
        if !st.flushing {
            st.queue.push(watcher);
        } else {
            let mut i = st.queue.len();
            while i > st.index && st.queue[i - 1].id() > id {
                i -= 1;
            }
            st.queue.insert(i, watcher);
        }
    });
}

/// Register a callback to run at the end of the next [`flush`], after every
/// queued watcher has re-run and post-run hooks have fired.
pub fn next_tick(cb: impl FnOnce() + 'static) {
    SCHEDULER.with(|s| s.borrow_mut().callbacks.push(Box::new(cb)));
}

/// Whether any watcher or tick callback is waiting for a flush.
#[must_use]
pub fn has_pending() -> bool {
    SCHEDULER.with(|s| {
        let st = s.borrow();
        st.queue.len() > st.index || !st.callbacks.is_empty()
    })
}

/// Errors for watchers dropped over circular updates since the last call.
/// Empties the report list.
pub fn drain_loop_reports() -> Vec<ReactiveError> {
    SCHEDULER.with(|s| {
        std::mem::take(&mut s.borrow_mut().loop_reports)
            .into_iter()
            .map(|watcher| ReactiveError::InfiniteUpdateLoop { watcher })
            .collect()
    })
}

/// Drain the queue: sort by ascending watcher id, run each watcher (its
/// `before` hook first), then fire post-run hooks in reverse processing
/// order, then run tick callbacks registered before this point. Re-entrant
/// calls (from inside a watcher) are no-ops; the outer flush picks up
/// whatever they would have drained.
pub fn flush() {
    let entered = SCHEDULER.with(|s| {
        let mut st = s.borrow_mut();
        if st.flushing {
            return false;
        }
        st.flushing = true;
        st.queue.sort_by_key(|w| w.id());
        true
    });
    if !entered {
        return;
    }

    // Resets flush state on normal exit and on unwind alike. Watchers not
    // yet processed stay in the queue (their `has` entries are intact), so
    // a panic mid-flush leaves them pending for the next flush.
    struct FlushGuard;
    impl Drop for FlushGuard {
        fn drop(&mut self) {
            SCHEDULER.with(|s| {
                let mut st = s.borrow_mut();
                let processed = st.index;
                st.queue.drain(..processed);
                st.circular.clear();
                st.flushing = false;
                st.index = 0;
            });
        }
    }

    let mut ran: Vec<Rc<dyn Subscriber>> = Vec::new();
    {
        let _guard = FlushGuard;
        loop {
            let next = SCHEDULER.with(|s| {
                let mut st = s.borrow_mut();
                if st.index >= st.queue.len() {
                    return None;
                }
                let watcher = Rc::clone(&st.queue[st.index]);
                st.index += 1;
                st.has.remove(&watcher.id());
                Some(watcher)
            });
            let Some(watcher) = next else { break };

            // Torn down while pending: skip without running hooks.
            if watcher.is_active() {
                watcher.run_before();
                watcher.run();
            }

            // The run may have re-queued this same watcher. Count it; past
            // the threshold, drop its pending entries and report the loop.
            SCHEDULER.with(|s| {
                let mut st = s.borrow_mut();
                let id = watcher.id();
                if st.has.contains(&id) {
                    let count = st.circular.entry(id).or_insert(0);
                    *count += 1;
                    if *count > MAX_UPDATE_COUNT {
                        tracing::error!(
                            watcher = id.0,
                            "circular update detected; dropping watcher from this flush"
                        );
                        st.loop_reports.push(id);
                        st.has.remove(&id);
                        let lower = st.index;
                        let mut i = st.queue.len();
                        while i > lower {
                            i -= 1;
                            if st.queue[i].id() == id {
                                st.queue.remove(i);
                            }
                        }
                    }
                }
            });
            ran.push(watcher);
        }
    }

    let callbacks = SCHEDULER.with(|s| std::mem::take(&mut s.borrow_mut().callbacks));

    for watcher in ran.iter().rev() {
        watcher.run_updated();
    }
    for cb in callbacks {
        cb();
    }
}
