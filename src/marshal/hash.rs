//! Type-directed hash-tree-root over a [`Value`] × [`TypeInfo`] pair.
//!
//! Basic values pack into one chunk. Sequences of basic values pack
//! contiguously and merkleize; sequences of composites merkleize their
//! element roots. Lists and bit-lists pad the tree to their declared limit
//! and mix the element count into the final root; vectors and containers
//! merkleize over their physical chunk count. A null composite hashes to
//! the all-zero root.

use alloy_primitives::B256;

use crate::codec::bits;
use crate::error::{Result, SszError};
use crate::merkle::root::{
    bitlist_root_with_limit, bitvector_root_with_limit, bytes_root, merkleize_chunks,
    merkleize_vector, mix_in_length, pack_chunks,
};
use crate::schema::TypeKind;
use crate::typeinfo::TypeInfo;
use crate::value::Value;
use crate::BYTES_PER_CHUNK;

/// Computes the 32-byte SSZ merkle root of a value.
pub fn hash_tree_root(value: &Value, info: &TypeInfo) -> Result<B256> {
    if value.is_null() {
        return Ok(B256::ZERO);
    }
    match info.kind() {
        kind if kind.is_basic() => basic_chunk(value, info),
        TypeKind::BitVector => {
            let bytes = value.as_bytes().ok_or_else(|| mismatch(value, info))?;
            bitvector_root_with_limit(bytes, info.bit_length() as u64)
        }
        TypeKind::BitList => {
            let bytes = value.as_bytes().ok_or_else(|| mismatch(value, info))?;
            let delimited = bits::encode_bitlist(bytes, info.bit_length())?;
            bitlist_root_with_limit(&delimited, info.bit_length() as u64)
        }
        TypeKind::Vector => vector_root(value, info),
        TypeKind::List => list_root(value, info),
        TypeKind::Str => match value {
            Value::Text(text) => {
                let base = bytes_root(text.as_bytes())?;
                Ok(mix_in_length(base, text.len() as u64))
            }
            _ => Err(mismatch(value, info)),
        },
        TypeKind::Container => container_root(value, info),
        other => Err(SszError::UnsupportedType(format!("{other} in merkle root"))),
    }
}

fn mismatch(value: &Value, info: &TypeInfo) -> SszError {
    SszError::UnsupportedType(format!(
        "cannot hash {} value as {}",
        value.kind_name(),
        info.kind()
    ))
}

/// A basic value is its own padded chunk.
fn basic_chunk(value: &Value, info: &TypeInfo) -> Result<B256> {
    let mut chunk = B256::ZERO;
    match (info.kind(), value) {
        (TypeKind::Uint8, Value::Uint8(v)) => chunk[0] = *v,
        (TypeKind::Uint16, Value::Uint16(v)) => chunk[..2].copy_from_slice(&v.to_le_bytes()),
        (TypeKind::Uint32, Value::Uint32(v)) => chunk[..4].copy_from_slice(&v.to_le_bytes()),
        (TypeKind::Uint64, Value::Uint64(v)) => chunk[..8].copy_from_slice(&v.to_le_bytes()),
        (TypeKind::Uint128, Value::Uint128(v) | Value::Uint256(v)) => {
            // Only the low half carries the value.
            chunk[..16].copy_from_slice(&v.to_le_bytes::<32>()[..16]);
        }
        (TypeKind::Uint256, Value::Uint128(v) | Value::Uint256(v)) => {
            chunk.copy_from_slice(&v.to_le_bytes::<32>());
        }
        (TypeKind::Boolean, Value::Bool(v)) => chunk[0] = *v as u8,
        _ => return Err(mismatch(value, info)),
    }
    Ok(chunk)
}

/// Packs a run of basic values little-endian, tightly.
fn pack_basic(items: &[Value], elem: &TypeInfo) -> Result<Vec<u8>> {
    let width = elem.kind().basic_size().ok_or_else(|| {
        SszError::UnsupportedType(format!("{} is not packable", elem.kind()))
    })?;
    let mut out = Vec::with_capacity(items.len() * width);
    for item in items {
        match (elem.kind(), item) {
            (TypeKind::Uint8, Value::Uint8(v)) => out.push(*v),
            (TypeKind::Uint16, Value::Uint16(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (TypeKind::Uint32, Value::Uint32(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (TypeKind::Uint64, Value::Uint64(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (TypeKind::Uint128, Value::Uint128(v) | Value::Uint256(v)) => {
                out.extend_from_slice(&v.to_le_bytes::<32>()[..16]);
            }
            (TypeKind::Uint256, Value::Uint128(v) | Value::Uint256(v)) => {
                out.extend_from_slice(&v.to_le_bytes::<32>());
            }
            (TypeKind::Boolean, Value::Bool(v)) => out.push(*v as u8),
            _ => return Err(mismatch(item, elem)),
        }
    }
    Ok(out)
}

fn vector_root(value: &Value, info: &TypeInfo) -> Result<B256> {
    let elem = info.element().expect("vectors resolve with an element");

    if elem.is_basic() {
        return match value {
            Value::Bytes(bytes) if elem.kind() == TypeKind::Uint8 => bytes_root(bytes),
            Value::Vector(items) | Value::List(items) => {
                let packed = pack_basic(items, elem)?;
                bytes_root(&packed)
            }
            _ => Err(mismatch(value, info)),
        };
    }

    let items = match value {
        Value::Vector(items) | Value::List(items) => items,
        _ => return Err(mismatch(value, info)),
    };
    if items.len() != info.length() {
        return Err(SszError::SizeMismatch {
            expected: info.length(),
            got: items.len(),
        });
    }

    // 32-byte byte-vector elements are already chunks.
    if elem.kind() == TypeKind::Vector
        && elem.fixed_size() == Some(BYTES_PER_CHUNK)
        && elem.element().map(|e| e.kind()) == Some(TypeKind::Uint8)
    {
        let mut chunks = Vec::with_capacity(items.len());
        for item in items {
            let bytes = item.as_bytes().ok_or_else(|| mismatch(item, elem))?;
            let mut chunk = [0u8; BYTES_PER_CHUNK];
            chunk[..bytes.len().min(BYTES_PER_CHUNK)]
                .copy_from_slice(&bytes[..bytes.len().min(BYTES_PER_CHUNK)]);
            chunks.push(chunk);
        }
        return merkleize_vector(&chunks, info.length() as u64);
    }

    let mut chunks = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let root = hash_tree_root(item, elem).map_err(|e| e.at(format!("[{i}]")))?;
        chunks.push(root.0);
    }
    merkleize_vector(&chunks, info.length() as u64)
}

fn list_root(value: &Value, info: &TypeInfo) -> Result<B256> {
    let elem = info.element().expect("lists resolve with an element");
    let max = info.length();

    if elem.is_basic() {
        let (packed, count) = match value {
            Value::Bytes(bytes) if elem.kind() == TypeKind::Uint8 => {
                (bytes.clone(), bytes.len())
            }
            Value::List(items) | Value::Vector(items) => (pack_basic(items, elem)?, items.len()),
            _ => return Err(mismatch(value, info)),
        };
        if max > 0 && count > max {
            return Err(SszError::LimitExceeded { limit: max, got: count });
        }
        let elem_width = elem.kind().basic_size().expect("basic kinds have a width");
        let chunk_limit = if max > 0 {
            (max * elem_width).div_ceil(BYTES_PER_CHUNK) as u64
        } else {
            packed.len().div_ceil(BYTES_PER_CHUNK) as u64
        };
        let base = merkleize_vector(&pack_chunks(&packed), chunk_limit)?;
        return Ok(mix_in_length(base, count as u64));
    }

    let items = match value {
        Value::List(items) | Value::Vector(items) => items,
        _ => return Err(mismatch(value, info)),
    };
    if max > 0 && items.len() > max {
        return Err(SszError::LimitExceeded {
            limit: max,
            got: items.len(),
        });
    }

    let mut chunks = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let root = hash_tree_root(item, elem).map_err(|e| e.at(format!("[{i}]")))?;
        chunks.push(root.0);
    }
    let leaf_limit = if max > 0 { max as u64 } else { items.len() as u64 };
    let base = merkleize_vector(&chunks, leaf_limit)?;
    Ok(mix_in_length(base, items.len() as u64))
}

fn container_root(value: &Value, info: &TypeInfo) -> Result<B256> {
    let values = match value {
        Value::Container(values) => values,
        _ => return Err(mismatch(value, info)),
    };
    if values.len() != info.fields().len() {
        return Err(SszError::SizeMismatch {
            expected: info.fields().len(),
            got: values.len(),
        });
    }

    let mut chunks = Vec::with_capacity(info.fields().len());
    for (field, val) in info.fields().iter().zip(values) {
        let root = hash_tree_root(val, field.info())
            .map_err(|e| e.at(field.name().to_owned()))?;
        chunks.push(root.0);
    }
    let mut out = [0u8; BYTES_PER_CHUNK];
    merkleize_chunks(&chunks, &mut out)?;
    Ok(B256::from(out))
}
