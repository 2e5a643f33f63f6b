#![forbid(unsafe_code)]

//! `ReactiveList<T>`: an observed sequence.
//!
//! The list carries one structural [`Dep`]: every read of length, contents,
//! or an individual slot registers it, and every structural or slot mutation
//! notifies it. This deliberately includes index assignment via [`set`],
//! which is an ordinary tracked mutation here rather than a blind spot.
//!
//! [`set`]: ReactiveList::set

use std::cell::RefCell;
use std::rc::Rc;

use crate::dep::Dep;
use crate::error::{invalid_mutation, Result};

struct ListInner<T> {
    items: RefCell<Vec<T>>,
    dep: Dep,
}

/// A reactive sequence. `Clone` shares the underlying storage.
pub struct ReactiveList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ReactiveList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> ReactiveList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                dep: Dep::new(),
            }),
        }
    }

    /// Tracked read of the whole sequence.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.inner.dep.depend();
        f(&self.inner.items.borrow())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.with(<[T]>::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with(<[T]>::is_empty)
    }

    pub fn push(&self, value: T) {
        self.inner.items.borrow_mut().push(value);
        self.inner.dep.notify();
    }

    pub fn pop(&self) -> Option<T> {
        let popped = self.inner.items.borrow_mut().pop();
        if popped.is_some() {
            self.inner.dep.notify();
        }
        popped
    }

    /// Insert at `index` (`index == len` appends).
    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        {
            let mut items = self.inner.items.borrow_mut();
            if index > items.len() {
                return Err(invalid_mutation(format!(
                    "insert index {index} out of bounds (len {})",
                    items.len()
                )));
            }
            items.insert(index, value);
        }
        self.inner.dep.notify();
        Ok(())
    }

    pub fn remove(&self, index: usize) -> Result<T> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return Err(invalid_mutation(format!(
                    "remove index {index} out of bounds (len {})",
                    items.len()
                )));
            }
            items.remove(index)
        };
        self.inner.dep.notify();
        Ok(removed)
    }

    /// Replace the slot at `index`. A tracked mutation like any other.
    pub fn set(&self, index: usize, value: T) -> Result<()> {
        {
            let mut items = self.inner.items.borrow_mut();
            let len = items.len();
            let Some(slot) = items.get_mut(index) else {
                return Err(invalid_mutation(format!(
                    "set index {index} out of bounds (len {len})"
                )));
            };
            *slot = value;
        }
        self.inner.dep.notify();
        Ok(())
    }

    /// Swap the slots at `a` and `b`. Swapping an index with itself is a
    /// no-op and does not notify.
    pub fn swap(&self, a: usize, b: usize) -> Result<()> {
        {
            let mut items = self.inner.items.borrow_mut();
            let len = items.len();
            if a >= len || b >= len {
                return Err(invalid_mutation(format!(
                    "swap indices {a}, {b} out of bounds (len {len})"
                )));
            }
            if a == b {
                return Ok(());
            }
            items.swap(a, b);
        }
        self.inner.dep.notify();
        Ok(())
    }

    pub fn clear(&self) {
        let was_empty = {
            let mut items = self.inner.items.borrow_mut();
            let was_empty = items.is_empty();
            items.clear();
            was_empty
        };
        if !was_empty {
            self.inner.dep.notify();
        }
    }

    pub fn retain(&self, f: impl FnMut(&T) -> bool) {
        let changed = {
            let mut items = self.inner.items.borrow_mut();
            let before = items.len();
            items.retain(f);
            items.len() != before
        };
        if changed {
            self.inner.dep.notify();
        }
    }

    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> std::cmp::Ordering) {
        self.inner.items.borrow_mut().sort_by(compare);
        self.inner.dep.notify();
    }

    pub fn reverse(&self) {
        self.inner.items.borrow_mut().reverse();
        self.inner.dep.notify();
    }

    /// Number of watchers currently subscribed (diagnostic).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.dep.sub_count()
    }
}

impl<T: Clone + 'static> ReactiveList<T> {
    /// Tracked read of one slot.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.with(|items| items.get(index).cloned())
    }

    /// Tracked copy of the whole sequence.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.with(<[T]>::to_vec)
    }
}

impl<T: 'static> Default for ReactiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}
