//! # Size-Classed Buffer Pool
//!
//! Buffers are pooled by power-of-two capacity class (class `i` holds
//! capacity `2^i`, classes 0..31). [`BufferPool::get`] hands out a buffer
//! with the requested length and a power-of-two capacity, zero-filled;
//! dropping the returned [`PooledBuf`] zeroes the buffer and pushes it back
//! onto its class, so the zeroed-on-acquire invariant holds without work on
//! the get path. Buffers whose capacity is not an exact power of two are
//! never pooled.
//!
//! Requests beyond the largest class allocate unpooled; dropping those
//! frees them. All operations are safe from any thread.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// Number of power-of-two size classes.
const SIZE_CLASSES: usize = 32;

struct PoolInner {
    classes: [Mutex<Vec<Vec<u8>>>; SIZE_CLASSES],
}

/// Thread-safe pool of reusable byte buffers.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                classes: std::array::from_fn(|_| Mutex::new(Vec::new())),
            }),
        }
    }

    /// Returns a zero-filled buffer of length `size` whose capacity is the
    /// next power of two. Oversized requests bypass the pool.
    pub fn get(&self, size: usize) -> PooledBuf {
        if size == 0 {
            return PooledBuf::unpooled(Vec::new());
        }
        let class = class_of(size);
        if class >= SIZE_CLASSES {
            return PooledBuf::unpooled(vec![0u8; size]);
        }

        let mut buf = self.inner.classes[class]
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; 1 << class]);
        buf.truncate(size);

        PooledBuf {
            buf: ManuallyDrop::new(buf),
            pool: Some(Arc::clone(&self.inner)),
            class,
        }
    }

    /// Buffers currently parked across all classes.
    pub fn available(&self) -> usize {
        self.inner.classes.iter().map(|c| c.lock().len()).sum()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("available", &self.available())
            .finish()
    }
}

/// Smallest `i` with `2^i >= size`.
fn class_of(size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    (usize::BITS - (size - 1).leading_zeros()) as usize
}

/// A pooled buffer that zeroes itself and returns to its class on drop.
pub struct PooledBuf {
    /// Always valid until Drop takes it.
    buf: ManuallyDrop<Vec<u8>>,
    pool: Option<Arc<PoolInner>>,
    class: usize,
}

impl PooledBuf {
    fn unpooled(buf: Vec<u8>) -> Self {
        Self {
            buf: ManuallyDrop::new(buf),
            pool: None,
            class: 0,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

impl Deref for PooledBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl std::fmt::Debug for PooledBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuf")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        // SAFETY: the buffer is taken exactly once, here; `self.buf` is
        // not touched again after this point.
        let mut buf = unsafe { ManuallyDrop::take(&mut self.buf) };
        let Some(pool) = self.pool.take() else {
            return;
        };
        let capacity = buf.capacity();
        // Capacity is pinned at allocation; anything else is not poolable.
        if capacity == 0 || !capacity.is_power_of_two() || capacity != 1 << self.class {
            return;
        }
        buf.clear();
        buf.resize(capacity, 0);
        pool.classes[self.class].lock().push(buf);
    }
}

/// The process-wide pool used by the merkle engine.
pub fn default_pool() -> &'static BufferPool {
    static DEFAULT: OnceLock<BufferPool> = OnceLock::new();
    DEFAULT.get_or_init(BufferPool::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_requested_length_and_pow2_capacity() {
        let pool = BufferPool::new();
        for size in [1usize, 3, 31, 32, 33, 100, 1024, 4097] {
            let buf = pool.get(size);
            assert_eq!(buf.len(), size);
            assert!(buf.buf.capacity().is_power_of_two(), "size {size}");
            assert!(buf.buf.capacity() >= size);
        }
    }

    #[test]
    fn buffers_are_zeroed_on_acquire() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.get(64);
            buf.fill(0xFF);
        }
        assert_eq!(pool.available(), 1);
        let buf = pool.get(64);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn dropped_buffers_return_to_their_class() {
        let pool = BufferPool::new();
        assert_eq!(pool.available(), 0);
        let a = pool.get(100);
        let b = pool.get(100);
        drop(a);
        assert_eq!(pool.available(), 1);
        drop(b);
        assert_eq!(pool.available(), 2);

        // Reuse picks a parked buffer rather than allocating.
        let c = pool.get(120);
        assert_eq!(pool.available(), 1);
        drop(c);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn distinct_sizes_use_distinct_classes() {
        let pool = BufferPool::new();
        drop(pool.get(10));
        drop(pool.get(1000));
        assert_eq!(pool.available(), 2);
        // A tiny request must not dequeue the large-class buffer.
        let small = pool.get(10);
        assert_eq!(small.len(), 10);
        drop(small);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn zero_size_requests_are_unpooled() {
        let pool = BufferPool::new();
        let buf = pool.get(0);
        assert_eq!(buf.len(), 0);
        drop(buf);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn class_of_rounds_up() {
        assert_eq!(class_of(1), 0);
        assert_eq!(class_of(2), 1);
        assert_eq!(class_of(3), 2);
        assert_eq!(class_of(4), 2);
        assert_eq!(class_of(5), 3);
        assert_eq!(class_of(1024), 10);
        assert_eq!(class_of(1025), 11);
    }

    #[test]
    fn clones_share_the_pool() {
        let a = BufferPool::new();
        let b = a.clone();
        drop(a.get(50));
        assert_eq!(b.available(), 1);
    }

    #[test]
    fn default_pool_is_shared() {
        let before = default_pool().available();
        drop(default_pool().get(4096));
        assert!(default_pool().available() >= before);
    }

    #[test]
    fn concurrent_get_and_put() {
        let pool = BufferPool::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let pool = pool.clone();
                scope.spawn(move || {
                    for i in 0..200usize {
                        let mut buf = pool.get(64 + i % 64);
                        buf[0] = i as u8;
                    }
                });
            }
        });
        assert!(pool.available() >= 1);
    }
}
