//! Property tests for mount roots.
//!
//! Invariants exercised:
//!
//! 1. Any burst of synchronous state writes collapses into at most one
//!    re-render per flush, and the patched backend output always equals a
//!    fresh mount of the final state.
//! 2. A failing render never corrupts the backend tree: output always
//!    matches the last state that rendered successfully.

use proptest::prelude::*;

use trellis_reactive::{scheduler, Reactive};
use trellis_runtime::{MountRoot, RenderError};
use trellis_vdom::{Backend, MemoryBackend, NodeId, Patcher, VNode, VNodeData};

fn keyed_item(key: i64) -> VNode {
    VNode::element(
        "li",
        Some(VNodeData::new().key(key)),
        vec![VNode::text(format!("item-{key}"))],
    )
}

fn view(keys: &[i64]) -> VNode {
    VNode::element("ul", None, keys.iter().copied().map(keyed_item).collect())
}

fn harness() -> (Patcher<MemoryBackend>, NodeId) {
    let mut backend = MemoryBackend::new();
    let container = backend.create_element("root");
    (Patcher::new(backend), container)
}

/// What a from-scratch mount of `keys` looks like.
fn fresh_markup(keys: &[i64]) -> String {
    let (mut patcher, container) = harness();
    patcher.mount(container, &view(keys)).unwrap();
    patcher.backend().render_to_string(container)
}

/// Distinct keys in random order, possibly empty.
fn keys_strategy() -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(0i64..10, 0..8).prop_map(|raw| {
        let mut seen = std::collections::HashSet::new();
        raw.into_iter().filter(|k| seen.insert(*k)).collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn bursts_coalesce_and_track_final_state(
        initial in keys_strategy(),
        bursts in proptest::collection::vec(
            proptest::collection::vec(keys_strategy(), 0..4),
            0..6,
        ),
    ) {
        let (patcher, container) = harness();
        let state = Reactive::new(initial.clone());
        let source = state.clone();
        let root = MountRoot::new(patcher, container, move || Ok(source.with(|k| view(k))));
        prop_assert_eq!(root.renders(), 1);

        let mut current = initial;
        let mut renders = 1u64;
        for burst in &bursts {
            let mut notified = false;
            for keys in burst {
                if *keys != current {
                    notified = true;
                    current = keys.clone();
                }
                state.set(keys.clone());
            }
            scheduler::flush();
            // One re-render per flush, and only if something changed.
            if notified {
                renders += 1;
            }
            prop_assert_eq!(root.renders(), renders);
        }

        let got = root.with_backend(|b| b.render_to_string(container));
        prop_assert_eq!(got, fresh_markup(&current));
    }

    #[test]
    fn failed_renders_keep_the_last_good_tree(
        steps in proptest::collection::vec((keys_strategy(), any::<bool>()), 1..10),
    ) {
        let (patcher, container) = harness();
        let state: Reactive<Vec<i64>> = Reactive::new(Vec::new());
        let healthy = Reactive::new(true);
        let (s2, h2) = (state.clone(), healthy.clone());
        let root = MountRoot::new(patcher, container, move || {
            if h2.get() {
                Ok(s2.with(|k| view(k)))
            } else {
                Err(RenderError::render("state store unavailable"))
            }
        });

        let mut last_good: Vec<i64> = Vec::new();
        for (keys, ok) in &steps {
            healthy.set(*ok);
            state.set(keys.clone());
            scheduler::flush();
            if *ok {
                last_good = keys.clone();
            } else {
                let _ = root.take_error();
            }
            let got = root.with_backend(|b| b.render_to_string(container));
            prop_assert_eq!(got, fresh_markup(&last_good));
        }
    }
}
