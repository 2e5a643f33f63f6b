#![forbid(unsafe_code)]

//! `Computed<T>`: a lazily cached derivation.
//!
//! Backed by a lazy [`Watcher`]: the getter does not run until the first
//! read, and the cached value is reused until one of the getter's
//! dependencies changes.
//!
//! A computed carries its own [`Dep`], so watchers that read *through* it
//! subscribe to the computed rather than to its sources. What invalidation
//! does depends on whether anyone is subscribed: with no subscribers the
//! computed merely goes dirty and recomputes on the next read; with
//! subscribers it recomputes immediately and notifies its Dep only when the
//! value actually changed, so an unchanged derivation never wakes its
//! dependents.

use crate::dep::Dep;
use crate::watcher::{Watcher, WatcherOptions};

pub struct Computed<T> {
    watcher: Watcher<T>,
    dep: Dep,
}

impl<T: PartialEq + 'static> Computed<T> {
    pub fn new(getter: impl Fn() -> T + 'static) -> Self {
        let watcher = Watcher::new(
            getter,
            None,
            WatcherOptions {
                lazy: true,
                ..WatcherOptions::default()
            },
        );
        let dep = Dep::new();
        watcher.inner().set_notify_dep(dep.clone());
        Self { watcher, dep }
    }

    /// Read the cached value, recomputing first if a dependency changed
    /// since the last read. Registers this computed (not its sources) on the
    /// currently evaluating watcher.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        if self.watcher.inner().is_dirty() {
            self.watcher.inner().evaluate();
        }
        self.dep.depend();
        self.watcher
            .inner()
            .with_value(|v| f(v.expect("computed evaluated but empty")))
    }

    /// Whether the next read will recompute.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.watcher.inner().is_dirty()
    }

    /// Stop tracking; subsequent reads return the last cached value.
    pub fn teardown(&self) {
        self.watcher.teardown();
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    #[must_use]
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}
