//! # sszkit — SimpleSerialize Codec and Merkle Hasher
//!
//! sszkit implements SSZ, the canonical binary encoding and merkle
//! hash-tree-root scheme of the Ethereum consensus layer, for user-defined
//! schemas resolved at runtime:
//!
//! - **Marshal**: a [`Value`] tree walks its resolved [`TypeInfo`] through
//!   the stack+heap encoder, emitting fixed slots in declaration order and
//!   stitching variable payloads behind 4-byte offsets.
//! - **Unmarshal**: a cursor decoder reads the fixed part, validates the
//!   offset table, and recursively decodes each variable field from its
//!   own window of the input, zero-copy.
//! - **Hash-tree-root**: values pack into 32-byte chunks and merkleize
//!   with zero-hash padding to each type's limit; list roots bind their
//!   length via mix-in-length.
//!
//! ## Quick Start
//!
//! ```
//! use sszkit::{hash_tree_root, marshal, unmarshal, Field, Schema, Value};
//!
//! let mut schema = Schema::new();
//! schema.define(Field::container(
//!     "Checkpoint",
//!     vec![Field::uint64("epoch"), Field::bytevector("root", 32)],
//! ));
//!
//! let info = schema.resolve("Checkpoint").unwrap();
//! let value = Value::Container(vec![Value::from(7u64), Value::from([0u8; 32])]);
//!
//! let bytes = marshal(&value, &info).unwrap();
//! assert_eq!(bytes.len(), 40);
//! assert_eq!(unmarshal(&bytes, &info).unwrap(), value);
//! let _root = hash_tree_root(&value, &info).unwrap();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   marshal / unmarshal / hash_tree_root   │
//! ├─────────────────────┬───────────────────┤
//! │  schema + typeinfo  │   value model      │
//! ├─────────────────────┴───────────────────┤
//! │   codec (bits / builder / decoder)       │
//! ├──────────────────────────────────────────┤
//! │   merkle (math / engine / proofs / tree) │
//! ├──────────────────────────────────────────┤
//! │   memory (size-classed buffer pool)      │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`schema`]: the SSZ type universe, validation, named-type catalogs
//! - [`typeinfo`]: resolved layouts and the per-catalog cache
//! - [`codec`]: bit packing, the stack+heap builder, the cursor decoder
//! - [`marshal`]: the kind-directed walkers
//! - [`merkle`]: zero hashes, the root engine, proofs, the incremental tree
//! - [`memory`]: pooled scratch buffers
//!
//! All public operations are safe to invoke from any thread; the library
//! is synchronous and spawns nothing.

pub mod codec;
pub mod error;
pub mod marshal;
pub mod memory;
pub mod merkle;
pub mod schema;
pub mod typeinfo;
pub mod value;

pub use error::{Result, SszError};
pub use marshal::{hash_tree_root, marshal, unmarshal};
pub use schema::{Field, Schema, TypeKind};
pub use typeinfo::{FieldInfo, TypeInfo};
pub use value::Value;

/// Width of the offset slots that stand in for variable fields.
pub const BYTES_PER_LENGTH_OFFSET: usize = 4;

/// Width of a merkle chunk, the leaf unit of every tree.
pub const BYTES_PER_CHUNK: usize = 32;
