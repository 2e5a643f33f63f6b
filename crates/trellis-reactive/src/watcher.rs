#![forbid(unsafe_code)]

//! `Watcher`: the observer side of the dependency graph.
//!
//! A watcher wraps a getter closure. Evaluating the getter with the watcher
//! pushed as the evaluation target records every [`Dep`] the getter reads;
//! when any of those Deps notifies, the watcher re-evaluates (immediately for
//! sync watchers, via the scheduler otherwise) and fires its change callback
//! if the produced value differs from the previous one.
//!
//! # Invariants
//!
//! 1. Dependency sets are rebuilt on every evaluation: Deps read this pass
//!    are subscribed, Deps read last pass but not this one are unsubscribed
//!    (`cleanup_deps`). Stale subscriptions never outlive one evaluation.
//! 2. A torn-down watcher removes itself from every Dep and never runs again.
//! 3. The evaluation target is popped even when the getter panics.
//!
//! # Failure Modes
//!
//! A getter that reads the watcher's own output value re-enters the value
//! cell and panics on the `RefCell` borrow. Don't do that; route cycles
//! through a second reactive cell instead.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ahash::AHashSet;

use crate::dep::{self, Dep, DepId, Subscriber, WatcherId};
use crate::scheduler;

// ─── Options ─────────────────────────────────────────────────────────────────

/// Construction-time knobs for a [`Watcher`].
#[derive(Default)]
pub struct WatcherOptions {
    /// Lazy watchers do not evaluate at construction and mark themselves
    /// dirty instead of scheduling on change. Used by computed values.
    pub lazy: bool,
    /// Sync watchers re-run immediately inside the mutation that invalidated
    /// them, bypassing the scheduler queue.
    pub sync: bool,
    /// Fire the change callback on every re-run, even when the new value
    /// compares equal to the old one.
    pub force: bool,
    /// Invoked by the scheduler just before this watcher re-runs in a flush.
    pub before: Option<Box<dyn Fn()>>,
    /// Invoked after a flush completes, in reverse processing order across
    /// all watchers that ran.
    pub on_updated: Option<Box<dyn Fn()>>,
}

// ─── Internals ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct TrackState {
    deps: Vec<Dep>,
    ids: AHashSet<DepId>,
    new_deps: Vec<Dep>,
    new_ids: AHashSet<DepId>,
}

pub(crate) struct WatcherInner<T> {
    id: WatcherId,
    me: Weak<WatcherInner<T>>,
    getter: Box<dyn Fn() -> T>,
    cb: Option<Box<dyn Fn(&T, Option<&T>)>>,
    before: Option<Box<dyn Fn()>>,
    on_updated: Option<Box<dyn Fn()>>,
    value: RefCell<Option<T>>,
    track: RefCell<TrackState>,
    active: Cell<bool>,
    dirty: Cell<bool>,
    lazy: bool,
    sync: bool,
    force: bool,
    /// Notified when a lazy watcher is invalidated, so downstream watchers
    /// reading through a computed value re-run without the computed having
    /// eagerly recomputed. Set by [`Computed`](crate::Computed).
    notify_dep: RefCell<Option<Dep>>,
}

/// Pops the evaluation target even if the getter panics.
struct TargetGuard;

impl Drop for TargetGuard {
    fn drop(&mut self) {
        dep::pop_target();
    }
}

impl<T: PartialEq + 'static> WatcherInner<T> {
    /// Evaluate the getter with this watcher as the evaluation target, then
    /// reconcile dependency subscriptions.
    pub(crate) fn get(&self) -> T {
        let me = self
            .me
            .upgrade()
            .expect("watcher evaluated during teardown");
        dep::push_target(me as Rc<dyn Subscriber>);
        let _guard = TargetGuard;
        let value = (self.getter)();
        drop(_guard);
        self.cleanup_deps();
        value
    }

    /// Drop subscriptions to Deps read last pass but not this one, then
    /// promote this pass's set to current.
    fn cleanup_deps(&self) {
        let mut t = self.track.borrow_mut();
        let TrackState {
            deps,
            ids,
            new_deps,
            new_ids,
        } = &mut *t;
        for old in deps.iter() {
            if !new_ids.contains(&old.id()) {
                old.remove_sub(self.id);
            }
        }
        std::mem::swap(deps, new_deps);
        std::mem::swap(ids, new_ids);
        new_deps.clear();
        new_ids.clear();
    }

    /// Lazy evaluation entry point for computed values.
    pub(crate) fn evaluate(&self) {
        let value = self.get();
        *self.value.borrow_mut() = Some(value);
        self.dirty.set(false);
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn set_notify_dep(&self, dep: Dep) {
        *self.notify_dep.borrow_mut() = Some(dep);
    }

    pub(crate) fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.value.borrow().as_ref())
    }

    pub(crate) fn teardown(&self) {
        if !self.active.get() {
            return;
        }
        self.active.set(false);
        let mut t = self.track.borrow_mut();
        for d in t.deps.drain(..) {
            d.remove_sub(self.id);
        }
        t.ids.clear();
        t.new_deps.clear();
        t.new_ids.clear();
    }
}

impl<T: PartialEq + 'static> Subscriber for WatcherInner<T> {
    fn id(&self) -> WatcherId {
        self.id
    }

    fn update(&self) {
        if self.lazy {
            // Unobserved lazy watchers just go dirty; the next read
            // recomputes. With downstream subscribers, recompute now and
            // propagate only when the value actually changed.
            let notify = self.notify_dep.borrow().clone();
            match notify {
                Some(d) if d.sub_count() > 0 => {
                    let changed = {
                        let new_value = self.get();
                        let mut slot = self.value.borrow_mut();
                        let changed = slot.as_ref() != Some(&new_value);
                        *slot = Some(new_value);
                        changed
                    };
                    self.dirty.set(false);
                    if changed {
                        d.notify();
                    }
                }
                _ => self.dirty.set(true),
            }
        } else if self.sync {
            self.run();
        } else if let Some(me) = self.me.upgrade() {
            scheduler::queue_watcher(me as Rc<dyn Subscriber>);
        }
    }

    fn run(&self) {
        if !self.active.get() {
            return;
        }
        let new_value = self.get();
        let old_value = self.value.borrow_mut().take();
        let fire = self.force || old_value.as_ref() != Some(&new_value);
        if fire {
            if let Some(cb) = &self.cb {
                cb(&new_value, old_value.as_ref());
            }
        }
        *self.value.borrow_mut() = Some(new_value);
    }

    fn run_before(&self) {
        if self.active.get() {
            if let Some(hook) = &self.before {
                hook();
            }
        }
    }

    fn run_updated(&self) {
        if self.active.get() {
            if let Some(hook) = &self.on_updated {
                hook();
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn track_dep(&self, dep: &Dep) {
        let mut t = self.track.borrow_mut();
        let id = dep.id();
        if t.new_ids.contains(&id) {
            return;
        }
        t.new_ids.insert(id);
        t.new_deps.push(dep.clone());
        if !t.ids.contains(&id) {
            dep.add_sub(self.id, self.me.clone() as Weak<dyn Subscriber>);
        }
    }
}

// ─── Public handle ───────────────────────────────────────────────────────────

/// An effect bound to the reactive values its getter reads.
///
/// Dropping the handle tears the watcher down: subscriptions are removed and
/// it will never re-run.
pub struct Watcher<T> {
    inner: Rc<WatcherInner<T>>,
}

impl<T: PartialEq + 'static> Watcher<T> {
    /// Build a watcher and, unless lazy, evaluate it once immediately (the
    /// initial evaluation establishes subscriptions; the callback does not
    /// fire for it).
    pub fn new(
        getter: impl Fn() -> T + 'static,
        cb: Option<Box<dyn Fn(&T, Option<&T>)>>,
        options: WatcherOptions,
    ) -> Self {
        let lazy = options.lazy;
        let inner = Rc::new_cyclic(|me| WatcherInner {
            id: dep::next_watcher_id(),
            me: me.clone(),
            getter: Box::new(getter),
            cb,
            before: options.before,
            on_updated: options.on_updated,
            value: RefCell::new(None),
            track: RefCell::new(TrackState::default()),
            active: Cell::new(true),
            dirty: Cell::new(lazy),
            lazy,
            sync: options.sync,
            force: options.force,
            notify_dep: RefCell::new(None),
        });
        if !lazy {
            let value = inner.get();
            *inner.value.borrow_mut() = Some(value);
        }
        Self { inner }
    }

    #[must_use]
    pub fn id(&self) -> WatcherId {
        self.inner.id
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Number of Deps currently subscribed to (diagnostic).
    #[must_use]
    pub fn dep_count(&self) -> usize {
        self.inner.track.borrow().deps.len()
    }

    /// Inspect the last produced value, if any.
    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        self.inner.with_value(f)
    }

    /// Unsubscribe from every Dep and deactivate. Idempotent.
    pub fn teardown(&self) {
        self.inner.teardown();
    }

    pub(crate) fn inner(&self) -> &Rc<WatcherInner<T>> {
        &self.inner
    }
}

impl<T> Drop for Watcher<T> {
    fn drop(&mut self) {
        self.inner.active.set(false);
        let mut t = self.inner.track.borrow_mut();
        for d in t.deps.drain(..) {
            d.remove_sub(self.inner.id);
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
