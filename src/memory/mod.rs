//! # Buffer Pooling
//!
//! Size-classed reuse of scratch buffers for the merkle engine and encoder
//! scratch space. See [`pool`] for the pool itself; [`default_pool`] is the
//! process-wide instance the engine draws from.

pub mod pool;

pub use pool::{default_pool, BufferPool, PooledBuf};
