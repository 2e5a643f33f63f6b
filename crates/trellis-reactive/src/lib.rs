#![forbid(unsafe_code)]

//! Reactive core: dependency tracking, watchers, and the batched scheduler.
//!
//! The pieces fit together like this:
//!
//! - [`Dep`]: a subject tracking the subscribers interested in one reactive
//!   slot. Reads call [`Dep::depend`], writes call [`Dep::notify`].
//! - [`Reactive`], [`ReactiveList`], [`ReactiveMap`]: observable containers.
//!   All reads track, all mutations notify. Mutation methods are the *only*
//!   entry points; there is no raw field access to bypass them.
//! - [`Watcher`]: a subscriber that evaluates a closure, records exactly the
//!   Deps it touched, and re-evaluates when any of them change. Dependency
//!   sets are reconciled after every run, so state read only inside a
//!   currently-true branch stops being tracked once the branch goes dead.
//! - [`Computed`]: a lazy watcher with a dirty flag and its own Dep, so
//!   derived values compose (including diamond shapes).
//! - [`scheduler`]: a thread-local queue that coalesces many synchronous
//!   mutations into one flush per tick, ordered by watcher creation id.
//!
//! Everything is single-threaded (`Rc`/`RefCell`); the ambient evaluation
//! stack and the scheduler live in thread-locals.

pub mod cell;
pub mod computed;
pub mod dep;
pub mod error;
pub mod list;
pub mod map;
pub mod scheduler;
pub mod watcher;

pub use cell::Reactive;
pub use computed::Computed;
pub use dep::{Dep, DepId, WatcherId};
pub use error::{ReactiveError, Result};
pub use list::ReactiveList;
pub use map::ReactiveMap;
pub use scheduler::{flush, has_pending, next_tick};
pub use watcher::{Watcher, WatcherOptions};
