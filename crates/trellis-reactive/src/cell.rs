#![forbid(unsafe_code)]

//! `Reactive<T>`: a single observed value.
//!
//! Reads from inside a watcher evaluation register the cell's [`Dep`] on the
//! watcher; writes notify subscribers unless the new value compares equal to
//! the current one. Handles are cheap clones sharing the same slot.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dep::Dep;

struct ReactiveInner<T> {
    value: RefCell<T>,
    dep: Dep,
}

/// A reactive cell. `Clone` shares the underlying slot.
pub struct Reactive<T> {
    inner: Rc<ReactiveInner<T>>,
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: PartialEq + 'static> Reactive<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ReactiveInner {
                value: RefCell::new(value),
                dep: Dep::new(),
            }),
        }
    }

    /// Tracked read by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.dep.depend();
        f(&self.inner.value.borrow())
    }

    /// Read without registering a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Subscribers are notified unless the new value
    /// compares equal to the current one; two values that are each unequal
    /// to themselves (NaN-like) also count as unchanged.
    pub fn set(&self, value: T) {
        {
            let current = self.inner.value.borrow();
            #[allow(clippy::eq_op)]
            let both_self_unequal = value != value && *current != *current;
            if value == *current || both_self_unequal {
                return;
            }
        }
        *self.inner.value.borrow_mut() = value;
        self.inner.dep.notify();
    }

    /// Mutate in place and notify unconditionally (no equality check is
    /// possible once the closure has run).
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.inner.dep.notify();
    }

    /// Number of watchers currently subscribed (diagnostic).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.dep.sub_count()
    }
}

impl<T: Clone + PartialEq + 'static> Reactive<T> {
    /// Tracked read by value.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Reactive")
            .field(&*self.inner.value.borrow())
            .finish()
    }
}
