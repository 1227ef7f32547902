//! # SSZ Codec Primitives
//!
//! The byte-level machinery shared by the marshalling walkers:
//!
//! - [`bits`]: bit-vector and bit-list packing, delimiter-bit handling.
//! - [`builder`]: the stack+heap encoder. Fixed bytes land on the stack in
//!   emission order; variable payloads are deferred to a heap and stitched
//!   back through 4-byte little-endian offsets at finish time.
//! - [`decoder`]: a cursor over a borrowed byte slice with scalar readers,
//!   the two-pass container decode, and the fixed/variable list decodes.
//!
//! The codec layer is schema-agnostic; it deals in byte layouts only. The
//! `marshal` module drives it with resolved type information.

pub mod bits;
pub mod builder;
pub mod decoder;

pub use builder::Builder;
pub use decoder::{Decoder, Part};
