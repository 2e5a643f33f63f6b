#![forbid(unsafe_code)]

//! `ReactiveMap<V>`: an observed string-keyed record.
//!
//! Tracking is per key: each key gets its own [`Dep`], created on first read
//! so that a watcher reading a key that does not exist yet still re-runs when
//! the key is later inserted. A separate structural Dep covers shape reads
//! (length, key iteration) and is notified on insert and remove.
//!
//! A frozen map rejects every mutation with
//! [`ReactiveError::InvalidMutation`]; freezing is one-way.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;

use crate::dep::Dep;
use crate::error::{invalid_mutation, Result};

struct MapInner<V> {
    entries: RefCell<AHashMap<String, V>>,
    key_deps: RefCell<AHashMap<String, Dep>>,
    shape: Dep,
    frozen: Cell<bool>,
}

/// A reactive record. `Clone` shares the underlying storage.
pub struct ReactiveMap<V> {
    inner: Rc<MapInner<V>>,
}

impl<V> Clone for ReactiveMap<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: PartialEq + 'static> ReactiveMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(MapInner {
                entries: RefCell::new(AHashMap::new()),
                key_deps: RefCell::new(AHashMap::new()),
                shape: Dep::new(),
                frozen: Cell::new(false),
            }),
        }
    }

    fn key_dep(&self, key: &str) -> Dep {
        let mut deps = self.inner.key_deps.borrow_mut();
        if let Some(dep) = deps.get(key) {
            dep.clone()
        } else {
            let dep = Dep::new();
            deps.insert(key.to_owned(), dep.clone());
            dep
        }
    }

    fn check_mutable(&self, key: &str) -> Result<()> {
        if self.inner.frozen.get() {
            Err(invalid_mutation(format!(
                "cannot mutate key {key:?}: map is frozen"
            )))
        } else {
            Ok(())
        }
    }

    /// Tracked read of one key. Reading an absent key still registers it, so
    /// a later insert re-runs the watcher.
    pub fn with_key<R>(&self, key: &str, f: impl FnOnce(Option<&V>) -> R) -> R {
        self.key_dep(key).depend();
        f(self.inner.entries.borrow().get(key))
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.with_key(key, |v| v.is_some())
    }

    /// Insert or replace. Replacing with an equal value neither stores nor
    /// notifies. Inserting a new key notifies shape subscribers too.
    pub fn set(&self, key: &str, value: V) -> Result<()> {
        self.check_mutable(key)?;
        let added = {
            let mut entries = self.inner.entries.borrow_mut();
            match entries.get(key) {
                Some(current) if *current == value => return Ok(()),
                Some(_) => {
                    entries.insert(key.to_owned(), value);
                    false
                }
                None => {
                    entries.insert(key.to_owned(), value);
                    true
                }
            }
        };
        self.key_dep(key).notify();
        if added {
            self.inner.shape.notify();
        }
        Ok(())
    }

    /// Remove a key. Removing an absent key is a quiet no-op.
    pub fn remove(&self, key: &str) -> Result<Option<V>> {
        self.check_mutable(key)?;
        let removed = self.inner.entries.borrow_mut().remove(key);
        if removed.is_some() {
            self.key_dep(key).notify();
            self.inner.shape.notify();
        }
        Ok(removed)
    }

    /// Tracked read of the whole record (registers the shape Dep).
    pub fn with<R>(&self, f: impl FnOnce(&AHashMap<String, V>) -> R) -> R {
        self.inner.shape.depend();
        f(&self.inner.entries.borrow())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.with(|m| m.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with(|m| m.is_empty())
    }

    /// Tracked, sorted key list.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.with(|m| {
            let mut keys: Vec<String> = m.keys().cloned().collect();
            keys.sort();
            keys
        })
    }

    /// Reject all further mutation. One-way.
    pub fn freeze(&self) {
        self.inner.frozen.set(true);
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.get()
    }
}

impl<V: Clone + PartialEq + 'static> ReactiveMap<V> {
    /// Tracked read of one key, by value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.with_key(key, |v| v.cloned())
    }
}

impl<V: PartialEq + 'static> Default for ReactiveMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;
    use crate::scheduler;
    use crate::watcher::{Watcher, WatcherOptions};

    fn key_watcher(map: &ReactiveMap<i32>, key: &str) -> (Watcher<Option<i32>>, Rc<Cell<u32>>) {
        let runs = Rc::new(Cell::new(0));
        let (m2, r2) = (map.clone(), runs.clone());
        let key = key.to_owned();
        let w = Watcher::new(
            move || {
                r2.set(r2.get() + 1);
                m2.get(&key)
            },
            None,
            WatcherOptions::default(),
        );
        (w, runs)
    }

    #[test]
    fn per_key_tracking_is_isolated() {
        let map = ReactiveMap::new();
        map.set("a", 1).unwrap();
        map.set("b", 2).unwrap();
        let (_wa, runs_a) = key_watcher(&map, "a");
        let (_wb, runs_b) = key_watcher(&map, "b");

        map.set("a", 10).unwrap();
        scheduler::flush();
        assert_eq!(runs_a.get(), 2);
        assert_eq!(runs_b.get(), 1);
    }

    #[test]
    fn reading_absent_key_tracks_future_insert() {
        let map = ReactiveMap::new();
        let (w, runs) = key_watcher(&map, "later");
        w.with_value(|v| assert_eq!(v, Some(&None)));

        map.set("later", 42).unwrap();
        scheduler::flush();
        assert_eq!(runs.get(), 2);
        w.with_value(|v| assert_eq!(v, Some(&Some(42))));
    }

    #[test]
    fn equal_replacement_is_silent() {
        let map = ReactiveMap::new();
        map.set("a", 1).unwrap();
        let (_w, runs) = key_watcher(&map, "a");
        map.set("a", 1).unwrap();
        scheduler::flush();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn shape_watcher_sees_inserts_and_removes_only() {
        let map = ReactiveMap::new();
        map.set("a", 1).unwrap();
        let runs = Rc::new(Cell::new(0));
        let (m2, r2) = (map.clone(), runs.clone());
        let _w = Watcher::new(
            move || {
                r2.set(r2.get() + 1);
                m2.keys()
            },
            None,
            WatcherOptions::default(),
        );

        map.set("a", 2).unwrap(); // value change, same shape
        scheduler::flush();
        assert_eq!(runs.get(), 1);

        map.set("b", 3).unwrap();
        scheduler::flush();
        assert_eq!(runs.get(), 2);

        map.remove("a").unwrap();
        scheduler::flush();
        assert_eq!(runs.get(), 3);
        assert_eq!(map.keys(), vec!["b".to_owned()]);
    }

    #[test]
    fn frozen_map_rejects_mutation() {
        let map = ReactiveMap::new();
        map.set("a", 1).unwrap();
        map.freeze();
        assert!(map.is_frozen());

        let err = map.set("a", 2).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidMutation { .. }));
        assert!(map.remove("a").unwrap_err().to_string().contains("frozen"));
        assert_eq!(map.get("a"), Some(1));
    }

    #[test]
    fn len_and_is_empty_report_shape() {
        let map = ReactiveMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        map.set("a", 1).unwrap();
        map.set("b", 2).unwrap();
        assert!(!map.is_empty());
        assert_eq!(map.len(), 2);
        map.remove("a").unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn removing_absent_key_is_quiet() {
        let map: ReactiveMap<i32> = ReactiveMap::new();
        let (_w, runs) = key_watcher(&map, "a");
        assert_eq!(map.remove("a").unwrap(), None);
        scheduler::flush();
        assert_eq!(runs.get(), 1);
    }
}
