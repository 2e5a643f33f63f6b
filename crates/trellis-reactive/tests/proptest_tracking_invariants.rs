//! Property tests for dependency tracking and flush semantics.
//!
//! Invariants exercised:
//!
//! 1. After any sequence of mutations followed by a flush, a watcher's value
//!    equals its getter applied to the final state (no stale results).
//! 2. A flush coalesces any number of mutations into at most one re-run per
//!    watcher.
//! 3. Subscriptions mirror reads exactly: a conditional getter is subscribed
//!    to its live branch and never to its dead branch.
//! 4. Teardown leaves no subscription behind, whatever happened before.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;

use trellis_reactive::{scheduler, Reactive, Watcher, WatcherOptions};

#[derive(Debug, Clone)]
enum Op {
    Set { cell: usize, value: i64 },
    Flush,
}

fn op_strategy(cells: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..cells, -1000i64..1000).prop_map(|(cell, value)| Op::Set { cell, value }),
        1 => Just(Op::Flush),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn watcher_value_matches_state_after_flush(
        initial in proptest::collection::vec(-1000i64..1000, 1..6),
        ops in proptest::collection::vec(op_strategy(6), 0..40),
    ) {
        let cells: Vec<Reactive<i64>> = initial.iter().copied().map(Reactive::new).collect();
        let watched = cells.clone();
        let w = Watcher::new(
            move || watched.iter().map(Reactive::get).sum::<i64>(),
            None,
            WatcherOptions::default(),
        );

        for op in &ops {
            match op {
                Op::Set { cell, value } => cells[cell % cells.len()].set(*value),
                Op::Flush => scheduler::flush(),
            }
        }
        scheduler::flush();

        let expected: i64 = cells.iter().map(Reactive::get).sum();
        let got = w.with_value(|v| v.copied());
        prop_assert_eq!(got, Some(expected));
        prop_assert!(!scheduler::has_pending());
        for cell in &cells {
            prop_assert_eq!(cell.subscriber_count(), 1);
        }
    }

    #[test]
    fn flush_runs_each_watcher_at_most_once(
        initial in -1000i64..1000,
        writes in proptest::collection::vec(-1000i64..1000, 1..30),
    ) {
        let cell = Reactive::new(initial);
        let runs = Rc::new(Cell::new(0u32));
        let (c2, r2) = (cell.clone(), runs.clone());
        let _w = Watcher::new(
            move || {
                r2.set(r2.get() + 1);
                c2.get()
            },
            None,
            WatcherOptions::default(),
        );
        prop_assert_eq!(runs.get(), 1);

        let mut any_change = false;
        let mut current = initial;
        for v in &writes {
            if *v != current {
                any_change = true;
            }
            current = if *v == current { current } else { *v };
            cell.set(*v);
        }
        scheduler::flush();

        let expected = if any_change { 2 } else { 1 };
        prop_assert_eq!(runs.get(), expected);
    }

    #[test]
    fn dead_branch_is_never_subscribed(
        flag_writes in proptest::collection::vec(any::<bool>(), 1..20),
        value_writes in proptest::collection::vec((any::<bool>(), -100i64..100), 0..20),
    ) {
        let flag = Reactive::new(true);
        let left = Reactive::new(0i64);
        let right = Reactive::new(0i64);
        let (f2, l2, r2) = (flag.clone(), left.clone(), right.clone());
        let w = Watcher::new(
            move || if f2.get() { l2.get() } else { r2.get() },
            None,
            WatcherOptions::default(),
        );

        for chunk in flag_writes.iter().zip(value_writes.iter().cycle()) {
            let (f, (side, v)) = chunk;
            flag.set(*f);
            if *side {
                left.set(*v);
            } else {
                right.set(*v);
            }
            scheduler::flush();

            prop_assert_eq!(w.dep_count(), 2);
            prop_assert_eq!(flag.subscriber_count(), 1);
            if *f {
                prop_assert_eq!(left.subscriber_count(), 1);
                prop_assert_eq!(right.subscriber_count(), 0);
            } else {
                prop_assert_eq!(left.subscriber_count(), 0);
                prop_assert_eq!(right.subscriber_count(), 1);
            }
        }
    }

    #[test]
    fn teardown_leaves_no_subscriptions(
        writes in proptest::collection::vec((0usize..4, -100i64..100), 0..30),
    ) {
        let cells: Vec<Reactive<i64>> = (0..4).map(|_| Reactive::new(0)).collect();
        let watched = cells.clone();
        let w = Watcher::new(
            move || watched.iter().map(Reactive::get).sum::<i64>(),
            None,
            WatcherOptions::default(),
        );

        for (i, v) in &writes {
            cells[*i].set(*v);
            scheduler::flush();
        }

        w.teardown();
        prop_assert_eq!(w.dep_count(), 0);
        for cell in &cells {
            prop_assert_eq!(cell.subscriber_count(), 0);
        }
        for (i, v) in &writes {
            cells[*i].set(v + 1);
        }
        scheduler::flush();
        prop_assert!(!w.is_active());
    }
}
