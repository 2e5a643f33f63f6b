//! Diff/patch throughput on the common child-list shapes: identical
//! re-render, append, reversal, and a deterministic shuffle.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use trellis_vdom::{Backend, MemoryBackend, Patcher, VNode, VNodeData};

fn keyed_child(key: i64) -> VNode {
    VNode::element(
        "li",
        Some(VNodeData::new().key(key)),
        vec![VNode::text(format!("item-{key}"))],
    )
}

fn list(keys: impl Iterator<Item = i64>) -> VNode {
    VNode::element("ul", None, keys.map(keyed_child).collect())
}

fn mounted(n: i64) -> (Patcher<MemoryBackend>, VNode) {
    let mut backend = MemoryBackend::new();
    let container = backend.create_element("root");
    let mut patcher = Patcher::new(backend);
    let tree = list(0..n);
    patcher
        .mount(container, &tree)
        .expect("mount cannot fail on a fresh container");
    (patcher, tree)
}

/// Deterministic pseudo-shuffle, stable across runs.
fn shuffled(n: i64) -> Vec<i64> {
    let mut keys: Vec<i64> = (0..n).collect();
    let mut state = 0x9e37_79b9_u64;
    for i in (1..keys.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        keys.swap(i, j);
    }
    keys
}

fn bench_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch");
    for n in [10i64, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("identical", n), &n, |b, &n| {
            let (mut patcher, old) = mounted(n);
            b.iter(|| {
                let new = list(0..n);
                patcher.patch(black_box(&old), black_box(&new)).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("append_one", n), &n, |b, &n| {
            let (mut patcher, old) = mounted(n);
            b.iter(|| {
                let new = list(0..=n);
                patcher.patch(black_box(&old), black_box(&new)).unwrap();
                // Patch back so every iteration starts from the same tree.
                let back = list(0..n);
                patcher.patch(&new, &back).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("reversal", n), &n, |b, &n| {
            let (mut patcher, old) = mounted(n);
            b.iter(|| {
                let new = list((0..n).rev());
                patcher.patch(black_box(&old), black_box(&new)).unwrap();
                let back = list(0..n);
                patcher.patch(&new, &back).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("shuffle", n), &n, |b, &n| {
            let (mut patcher, old) = mounted(n);
            let order = shuffled(n);
            b.iter(|| {
                let new = list(order.iter().copied());
                patcher.patch(black_box(&old), black_box(&new)).unwrap();
                let back = list(0..n);
                patcher.patch(&new, &back).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_mount(c: &mut Criterion) {
    c.bench_function("mount_1000", |b| {
        b.iter(|| {
            let mut backend = MemoryBackend::new();
            let container = backend.create_element("root");
            let mut patcher = Patcher::new(backend);
            let tree = list(0..1000);
            patcher.mount(container, black_box(&tree)).unwrap();
        });
    });
}

criterion_group!(benches, bench_patch, bench_mount);
criterion_main!(benches);
