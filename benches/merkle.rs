//! Merkle engine benchmarks for sszkit
//!
//! Covers the flat reduction at several chunk counts and the incremental
//! tree's sparse-update advantage over full recomputation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use parking_lot::Mutex;
use std::sync::Arc;
use sszkit::merkle::{merkleize_chunks, MerkleTree, DEFAULT_CACHE_DEPTH};

fn bench_flat_merkleize(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkleize_chunks");
    for count in [64usize, 1024, 8192] {
        let chunks: Vec<[u8; 32]> = (0..count).map(|i| [i as u8; 32]).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &chunks, |b, chunks| {
            let mut out = [0u8; 32];
            b.iter(|| {
                merkleize_chunks(black_box(chunks), &mut out).unwrap();
                out
            })
        });
    }
    group.finish();
}

fn bench_incremental_sparse_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_tree");
    for leaves in [1024usize, 8192] {
        let store = Arc::new(Mutex::new(
            (0..leaves).map(|i| [i as u8; 32]).collect::<Vec<_>>(),
        ));
        let tree = {
            let store = store.clone();
            MerkleTree::new(
                leaves,
                DEFAULT_CACHE_DEPTH,
                move |idx, out| *out = store.lock()[idx],
                None,
            )
        };
        tree.compute_root();

        group.bench_with_input(
            BenchmarkId::new("one_dirty_leaf", leaves),
            &tree,
            |b, tree| {
                b.iter(|| {
                    tree.mark_leaf_dirty(black_box(17));
                    tree.compute_root()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_flat_merkleize, bench_incremental_sparse_updates);
criterion_main!(benches);
