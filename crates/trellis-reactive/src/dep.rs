#![forbid(unsafe_code)]

//! `Dep`: the subject side of the dependency graph.
//!
//! One `Dep` exists per reactive slot (one per [`Reactive`](crate::Reactive)
//! cell, one structural `Dep` per list/map). Watchers subscribe to the Deps
//! they touch during evaluation; a mutation notifies the Dep's subscribers in
//! subscription order.
//!
//! # Invariants
//!
//! 1. A subscriber appears at most once per Dep (dedup by watcher id).
//! 2. `notify()` iterates a snapshot of the subscriber list, so subscribers
//!    may add or remove themselves mid-notify without corrupting the pass.
//! 3. Dead `Weak` entries are pruned lazily during notification.
//!
//! # Evaluation targets
//!
//! Tracking needs to know *which* watcher is currently evaluating. That is
//! ambient, dynamically-scoped state: a thread-local stack of evaluation
//! targets, pushed/popped around every watcher evaluation so nested
//! evaluations (a computed read during a render) attribute their reads to the
//! innermost watcher.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

// ─── Ids ─────────────────────────────────────────────────────────────────────

/// Unique id of a [`Dep`], monotonically increasing per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepId(pub u64);

/// Unique id of a watcher. Assigned at construction in strictly increasing
/// order; the scheduler flushes in ascending id order, which is what makes
/// parents (constructed first) run before their children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(pub u64);

thread_local! {
    static NEXT_DEP_ID: Cell<u64> = const { Cell::new(1) };
    static NEXT_WATCHER_ID: Cell<u64> = const { Cell::new(1) };
}

fn next_dep_id() -> DepId {
    NEXT_DEP_ID.with(|c| {
        let id = c.get();
        c.set(id + 1);
        DepId(id)
    })
}

pub(crate) fn next_watcher_id() -> WatcherId {
    NEXT_WATCHER_ID.with(|c| {
        let id = c.get();
        c.set(id + 1);
        WatcherId(id)
    })
}

// ─── Subscriber trait ────────────────────────────────────────────────────────

/// The subscriber side of the graph. Implemented by watcher internals; the
/// same trait serves the evaluation-target stack (`track_dep`) and the
/// scheduler (`run`, `run_before`, `run_updated`).
pub(crate) trait Subscriber {
    fn id(&self) -> WatcherId;

    /// A dependency changed. Lazy watchers mark dirty; eager watchers queue
    /// themselves (or run synchronously when flagged `sync`).
    fn update(&self);

    /// Scheduler job body: re-evaluate and invoke the change callback.
    fn run(&self);

    /// Pre-run hook, invoked by the scheduler just before `run`.
    fn run_before(&self);

    /// Post-flush hook, invoked in reverse processing order after a flush.
    fn run_updated(&self);

    fn is_active(&self) -> bool;

    /// Called while this subscriber is the innermost evaluation target and a
    /// Dep is read: record the edge and subscribe if new.
    fn track_dep(&self, dep: &Dep);
}

// ─── Evaluation-target stack ─────────────────────────────────────────────────

thread_local! {
    static TARGET_STACK: RefCell<Vec<Rc<dyn Subscriber>>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn push_target(target: Rc<dyn Subscriber>) {
    TARGET_STACK.with(|s| s.borrow_mut().push(target));
}

pub(crate) fn pop_target() {
    TARGET_STACK.with(|s| {
        s.borrow_mut().pop();
    });
}

pub(crate) fn current_target() -> Option<Rc<dyn Subscriber>> {
    TARGET_STACK.with(|s| s.borrow().last().cloned())
}

/// Whether any watcher is currently evaluating on this thread.
#[must_use]
pub fn is_tracking() -> bool {
    TARGET_STACK.with(|s| !s.borrow().is_empty())
}

// ─── Dep ─────────────────────────────────────────────────────────────────────

type SubEntry = (WatcherId, Weak<dyn Subscriber>);

struct DepInner {
    id: DepId,
    subs: RefCell<SmallVec<[SubEntry; 4]>>,
}

/// A subject tracking the watchers interested in one reactive slot.
///
/// Cheaply cloneable; clones share the subscriber list.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

impl std::fmt::Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.inner.id)
            .field("subs", &self.inner.subs.borrow().len())
            .finish()
    }
}

impl Dep {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                id: next_dep_id(),
                subs: RefCell::new(SmallVec::new()),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> DepId {
        self.inner.id
    }

    /// Number of live subscribers. Prunes nothing; dead weaks still count
    /// until the next notify pass cleans them up.
    #[must_use]
    pub fn sub_count(&self) -> usize {
        self.inner.subs.borrow().len()
    }

    /// Register the currently evaluating watcher (if any) as a subscriber.
    /// No-op when nothing is evaluating or the watcher already tracked this
    /// Dep during the current evaluation pass.
    pub fn depend(&self) {
        if let Some(target) = current_target() {
            target.track_dep(self);
        }
    }

    /// Synchronously invoke `update()` on a snapshot of the subscriber list,
    /// in subscription order. The snapshot is what lets subscribers add or
    /// remove themselves mid-pass; dead entries are pruned here.
    pub fn notify(&self) {
        let snapshot: Vec<Rc<dyn Subscriber>> = {
            let mut subs = self.inner.subs.borrow_mut();
            subs.retain(|(_, weak)| weak.strong_count() > 0);
            subs.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };
        for sub in snapshot {
            sub.update();
        }
    }

    pub(crate) fn add_sub(&self, id: WatcherId, sub: Weak<dyn Subscriber>) {
        let mut subs = self.inner.subs.borrow_mut();
        if subs.iter().any(|(sid, _)| *sid == id) {
            return;
        }
        subs.push((id, sub));
    }

    pub(crate) fn remove_sub(&self, id: WatcherId) {
        self.inner
            .subs
            .borrow_mut()
            .retain(|(sid, _)| *sid != id);
    }

    /// Whether a given watcher id is currently subscribed (test/diagnostic).
    #[must_use]
    pub fn has_subscriber(&self, id: WatcherId) -> bool {
        self.inner.subs.borrow().iter().any(|(sid, _)| *sid == id)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
