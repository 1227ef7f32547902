//! # Incremental Merkle Tree
//!
//! A cached layered tree for leaf sets that change incrementally. The
//! leaves themselves are not stored; a caller-supplied closure recomputes
//! any leaf on demand, and `layers[i]` caches the bytes of tree level
//! `i + 1` up to a bounded depth. Root recomputation cost scales with the
//! number of dirty leaves rather than the leaf count.
//!
//! Dirty tracking uses the stored bytes themselves: marking a leaf dirty
//! zeroes its ancestor chunks along the spine, and the recompute pass
//! re-hashes exactly the chunks that read as the zero chunk. No separate
//! dirty-bit tree exists; the per-leaf atomic flags only defer the spine
//! walk to the next root computation so that marking stays cheap and
//! concurrent.
//!
//! ## Locking
//!
//! A reader/writer lock guards the layers: `mark_leaf_dirty` takes the
//! reader side (flag stores are atomic), while `append_leaf` and
//! `compute_root` take the writer side. After `compute_root` returns, the
//! root reflects every mark that happened before the call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::B256;
use parking_lot::RwLock;
use tracing::trace;

use crate::merkle::hasher::sha256;
use crate::merkle::math::{get_depth, zero_hash};
use crate::merkle::root::{compute_merkle_root_from_level, compute_merkle_root_range};
use crate::BYTES_PER_CHUNK;

/// Depth of stored intermediate layers. Deeper subtrees are finished
/// through the flat root engine on every computation.
pub const DEFAULT_CACHE_DEPTH: usize = 12;

type LeafFn = Arc<dyn Fn(usize, &mut [u8; 32]) + Send + Sync>;

pub struct MerkleTree {
    inner: RwLock<TreeState>,
}

struct TreeState {
    compute_leaf: LeafFn,
    /// `layers[i]` holds level `i + 1`; level 0 (the leaves) is recomputed
    /// on demand. `None` = never materialized.
    layers: Vec<Option<Vec<u8>>>,
    leaves_count: usize,
    /// Optional padding target enabling limit-oriented hashing.
    limit: Option<u64>,
    dirty: Vec<AtomicBool>,
}

impl std::fmt::Debug for MerkleTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("MerkleTree")
            .field("leaves_count", &state.leaves_count)
            .field("limit", &state.limit)
            .field("cached_layers", &state.layers.len())
            .finish()
    }
}

impl MerkleTree {
    /// Creates a tree over `leaves_count` leaves with `max_cache_depth`
    /// stored layers. Every leaf starts dirty and is computed on the first
    /// root computation.
    pub fn new(
        leaves_count: usize,
        max_cache_depth: usize,
        compute_leaf: impl Fn(usize, &mut [u8; 32]) + Send + Sync + 'static,
        limit: Option<u64>,
    ) -> Self {
        let mut layers = Vec::new();
        layers.resize_with(max_cache_depth.max(1), || None);
        let first_layer_size = leaves_count.div_ceil(2) * BYTES_PER_CHUNK;
        layers[0] = Some(vec![0u8; first_layer_size]);

        let mut dirty = Vec::with_capacity(leaves_count);
        dirty.resize_with(leaves_count, || AtomicBool::new(false));

        Self {
            inner: RwLock::new(TreeState {
                compute_leaf: Arc::new(compute_leaf),
                layers,
                leaves_count,
                limit,
                dirty,
            }),
        }
    }

    /// Replaces the leaf computation closure.
    pub fn set_compute_leaf(&self, compute_leaf: impl Fn(usize, &mut [u8; 32]) + Send + Sync + 'static) {
        self.inner.write().compute_leaf = Arc::new(compute_leaf);
    }

    pub fn leaves_count(&self) -> usize {
        self.inner.read().leaves_count
    }

    /// Flags a leaf for recomputation on the next root. Safe to call
    /// concurrently with other markings.
    pub fn mark_leaf_dirty(&self, index: usize) {
        let state = self.inner.read();
        state.dirty[index].store(true, Ordering::Relaxed);
    }

    /// Appends one leaf, growing each cached layer as needed. The new leaf
    /// is implicitly dirty.
    pub fn append_leaf(&self) {
        let mut state = self.inner.write();
        for i in 0..state.layers.len() {
            extend_layer(&mut state, i);
        }
        state.leaves_count += 1;
        state.dirty.push(AtomicBool::new(true));
    }

    /// Recomputes and returns the root, re-hashing only the spines of
    /// leaves marked dirty since the previous computation.
    pub fn compute_root(&self) -> B256 {
        let mut guard = self.inner.write();
        let state = &mut *guard;

        let mut dirty_count = 0usize;
        for idx in 0..state.dirty.len() {
            if state.dirty[idx].swap(false, Ordering::Relaxed) {
                mark_spine(state, idx);
                dirty_count += 1;
            }
        }
        trace!(
            leaves = state.leaves_count,
            dirty = dirty_count,
            "incremental root recompute"
        );

        if state.leaves_count == 0 {
            return match state.limit {
                None => zero_hash(0),
                Some(limit) => zero_hash(get_depth(limit)),
            };
        }

        // Tiny trees skip the cache entirely.
        if state.leaves_count <= 3 {
            let mut buf = [0u8; 3 * BYTES_PER_CHUNK];
            for i in 0..state.leaves_count {
                let chunk: &mut [u8; 32] = (&mut buf
                    [i * BYTES_PER_CHUNK..(i + 1) * BYTES_PER_CHUNK])
                    .try_into()
                    .expect("chunk window is 32 bytes");
                (*state.compute_leaf)(i, chunk);
            }
            let data = &buf[..state.leaves_count * BYTES_PER_CHUNK];
            let mut root = B256::ZERO;
            finish_flat(state, data, 0, &mut root);
            return root;
        }

        for i in 0..state.layers.len() {
            compute_layer(state, i);
        }

        let top = state
            .layers
            .iter()
            .position(|layer| matches!(layer, Some(bytes) if bytes.is_empty()))
            .map(|i| i - 1)
            .unwrap_or(state.layers.len() - 1);

        let layer = state.layers[top]
            .take()
            .expect("layers below the first empty one are materialized");
        let mut root = B256::ZERO;
        finish_flat(state, &layer, top + 1, &mut root);
        state.layers[top] = Some(layer);
        root
    }

    /// Duplicates this tree's state into `other`, reusing `other`'s
    /// buffers where capacity allows.
    pub fn copy_into(&self, other: &MerkleTree) {
        let mut dst = other.inner.write();
        let src = self.inner.read();

        dst.compute_leaf = src.compute_leaf.clone();
        dst.leaves_count = src.leaves_count;
        dst.limit = src.limit;

        dst.layers.resize_with(src.layers.len(), || None);
        for (d, s) in dst.layers.iter_mut().zip(src.layers.iter()) {
            match s {
                None => *d = None,
                Some(bytes) => match d {
                    Some(existing) => {
                        existing.clear();
                        existing.extend_from_slice(bytes);
                    }
                    None => *d = Some(bytes.clone()),
                },
            }
        }

        dst.dirty.resize_with(src.dirty.len(), || AtomicBool::new(false));
        for (d, s) in dst.dirty.iter_mut().zip(src.dirty.iter()) {
            d.store(s.load(Ordering::Relaxed), Ordering::Relaxed);
        }
    }
}

/// Bytes of level `layer_idx + 1` when the tree holds `leaves` leaves.
fn layer_byte_len(leaves: usize, layer_idx: usize) -> usize {
    let divisor = 1usize << (layer_idx + 1);
    leaves.div_ceil(divisor) * BYTES_PER_CHUNK
}

/// Zeroes the ancestor chunk of `idx` on every stored layer, allocating
/// zeroed (fully dirty) layers on first touch.
fn mark_spine(state: &mut TreeState, idx: usize) {
    for i in 0..state.layers.len() {
        let divisor = 1usize << (i + 1);
        let node_count = state.leaves_count.div_ceil(divisor);
        if node_count == 0 {
            break;
        }
        let byte_len = layer_byte_len(state.leaves_count, i);
        let layer = state.layers[i].get_or_insert_with(|| vec![0u8; byte_len]);
        if layer.len() < byte_len {
            layer.resize(byte_len, 0);
        }
        let at = (idx / divisor) * BYTES_PER_CHUNK;
        layer[at..at + BYTES_PER_CHUNK].fill(0);
        if node_count == 1 {
            break;
        }
    }
}

/// Grows layer `layer_idx` for one appended leaf, zero-marking the node
/// that covers the new position.
fn extend_layer(state: &mut TreeState, layer_idx: usize) {
    let prev_nodes = if layer_idx == 0 {
        state.leaves_count + 1
    } else {
        state.layers[layer_idx - 1]
            .as_ref()
            .map_or(0, |l| l.len() / BYTES_PER_CHUNK)
    };

    let mut new_nodes = prev_nodes / 2;
    if new_nodes == 0 {
        match &mut state.layers[layer_idx] {
            Some(layer) => layer.clear(),
            None => {}
        }
        return;
    }
    if prev_nodes % 2 != 0 {
        new_nodes += 1;
    }
    let new_len = new_nodes * BYTES_PER_CHUNK;

    match &mut state.layers[layer_idx] {
        None => state.layers[layer_idx] = Some(vec![0u8; new_len]),
        Some(layer) => {
            layer.resize(new_len, 0);
            layer[new_len - BYTES_PER_CHUNK..].fill(0);
        }
    }
}

/// Re-hashes every chunk of layer `layer_idx` that reads as the zero
/// chunk, pulling from the previous layer (or the leaves for layer 0).
fn compute_layer(state: &mut TreeState, layer_idx: usize) {
    let divisor = 1usize << (layer_idx + 1);

    if state.layers[layer_idx].is_none() {
        let prev_nodes = state.layers[layer_idx - 1]
            .as_ref()
            .map_or(0, |l| l.len() / BYTES_PER_CHUNK);
        let mut new_nodes = prev_nodes / 2;
        if new_nodes == 0 {
            state.layers[layer_idx] = Some(Vec::new());
            return;
        }
        if prev_nodes % 2 != 0 {
            new_nodes += 1;
        }
        state.layers[layer_idx] = Some(vec![0u8; new_nodes * BYTES_PER_CHUNK]);
    }
    if state.layers[layer_idx].as_ref().is_some_and(|l| l.is_empty()) {
        return;
    }

    let compute_leaf = state.compute_leaf.clone();
    let iterations = state.leaves_count.div_ceil(divisor);
    let mut buf = [0u8; 2 * BYTES_PER_CHUNK];

    if layer_idx == 0 {
        let layer = state.layers[0].as_mut().expect("layer 0 is materialized");
        for i in 0..iterations {
            let at = i * BYTES_PER_CHUNK;
            if at + BYTES_PER_CHUNK > layer.len() {
                break;
            }
            if layer[at..at + BYTES_PER_CHUNK] != [0u8; 32] {
                continue;
            }
            let first = i * 2;
            {
                let (left, right) = buf.split_at_mut(BYTES_PER_CHUNK);
                let left: &mut [u8; 32] = left.try_into().expect("half buffer is 32 bytes");
                (*compute_leaf)(first, left);
                if first == state.leaves_count - 1 {
                    right.fill(0);
                } else {
                    let right: &mut [u8; 32] = right.try_into().expect("half buffer is 32 bytes");
                    (*compute_leaf)(first + 1, right);
                }
            }
            let digest = sha256(&buf);
            layer[at..at + BYTES_PER_CHUNK].copy_from_slice(digest.as_slice());
        }
        return;
    }

    let (lower, upper) = state.layers.split_at_mut(layer_idx);
    let prev = lower[layer_idx - 1]
        .as_ref()
        .expect("previous layer computed first");
    let layer = upper[0].as_mut().expect("materialized above");

    for i in 0..iterations {
        let at = i * BYTES_PER_CHUNK;
        if at + BYTES_PER_CHUNK > layer.len() {
            break;
        }
        if layer[at..at + BYTES_PER_CHUNK] != [0u8; 32] {
            continue;
        }
        let child_from = i * 2 * BYTES_PER_CHUNK;
        let child_to = child_from + 2 * BYTES_PER_CHUNK;
        if child_to > prev.len() {
            buf[..BYTES_PER_CHUNK].copy_from_slice(&prev[child_from..child_from + BYTES_PER_CHUNK]);
            buf[BYTES_PER_CHUNK..].copy_from_slice(zero_hash(layer_idx).as_slice());
        } else {
            buf.copy_from_slice(&prev[child_from..child_to]);
        }
        let digest = sha256(&buf);
        layer[at..at + BYTES_PER_CHUNK].copy_from_slice(digest.as_slice());
    }
}

/// Finishes through the flat engine from the topmost stored level.
fn finish_flat(state: &TreeState, data: &[u8], start_level: usize, root: &mut B256) {
    match state.limit {
        None => compute_merkle_root_from_level(
            data,
            root.as_mut_slice(),
            state.leaves_count * BYTES_PER_CHUNK,
            start_level,
        )
        .expect("cached layers are 32-byte aligned"),
        Some(limit) => {
            compute_merkle_root_range(data, root.as_mut_slice(), limit, start_level)
                .expect("cached layers are 32-byte aligned")
        }
    }
}
