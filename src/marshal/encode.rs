//! Kind-directed encoding of a [`Value`] guided by its [`TypeInfo`].

use crate::codec::{bits, Builder};
use crate::error::{Result, SszError};
use crate::schema::TypeKind;
use crate::typeinfo::TypeInfo;
use crate::value::Value;

/// Encodes a value to its SSZ byte form.
///
/// A top-level variable value serializes as its canonical body (the offset
/// table and payloads for lists, the fixed part plus heap for containers)
/// with no enclosing offset slot.
pub fn marshal(value: &Value, info: &TypeInfo) -> Result<Vec<u8>> {
    if value.is_null() {
        return Err(SszError::UnsupportedType(
            "null value at top level".into(),
        ));
    }
    let mut builder = Builder::new();
    if info.is_variable() {
        encode_variable_body(&mut builder, value, info)?;
    } else {
        encode_fixed(&mut builder, value, info)?;
    }
    builder.finish()
}

fn mismatch(value: &Value, info: &TypeInfo) -> SszError {
    SszError::UnsupportedType(format!(
        "cannot encode {} value as {}",
        value.kind_name(),
        info.kind()
    ))
}

/// Encodes a fixed-size value inline on the current stack.
pub(crate) fn encode_fixed(b: &mut Builder, value: &Value, info: &TypeInfo) -> Result<()> {
    if value.is_null() {
        return Err(SszError::UnsupportedType(
            "null value in fixed field".into(),
        ));
    }
    match info.kind() {
        TypeKind::Uint8 => match value {
            Value::Uint8(v) => Ok(b.write_uint8(*v)),
            _ => Err(mismatch(value, info)),
        },
        TypeKind::Uint16 => match value {
            Value::Uint16(v) => Ok(b.write_uint16(*v)),
            _ => Err(mismatch(value, info)),
        },
        TypeKind::Uint32 => match value {
            Value::Uint32(v) => Ok(b.write_uint32(*v)),
            _ => Err(mismatch(value, info)),
        },
        TypeKind::Uint64 => match value {
            Value::Uint64(v) => Ok(b.write_uint64(*v)),
            _ => Err(mismatch(value, info)),
        },
        TypeKind::Uint128 => match value {
            Value::Uint128(v) | Value::Uint256(v) => Ok(b.write_uint128(v)),
            _ => Err(mismatch(value, info)),
        },
        TypeKind::Uint256 => match value {
            Value::Uint128(v) | Value::Uint256(v) => Ok(b.write_uint256(v)),
            _ => Err(mismatch(value, info)),
        },
        TypeKind::Boolean => match value {
            Value::Bool(v) => Ok(b.write_bool(*v)),
            _ => Err(mismatch(value, info)),
        },
        TypeKind::BitVector => {
            let bytes = value.as_bytes().ok_or_else(|| mismatch(value, info))?;
            let encoded = bits::encode_bitvector(bytes, info.bit_length())?;
            b.write_fixed(&encoded);
            Ok(())
        }
        TypeKind::Vector => encode_fixed_vector(b, value, info),
        TypeKind::Container => encode_container_body(b, value, info),
        other => Err(SszError::UnsupportedType(format!(
            "{other} in fixed position"
        ))),
    }
}

fn encode_fixed_vector(b: &mut Builder, value: &Value, info: &TypeInfo) -> Result<()> {
    let element = info.element().expect("vectors resolve with an element");
    match value {
        // Byte fast-path: a declared size must match exactly.
        Value::Bytes(bytes) if element.kind() == TypeKind::Uint8 => {
            if bytes.len() != info.length() {
                return Err(SszError::SizeMismatch {
                    expected: info.length(),
                    got: bytes.len(),
                });
            }
            b.write_fixed(bytes);
            Ok(())
        }
        Value::Vector(items) | Value::List(items) => {
            if items.len() != info.length() {
                return Err(SszError::SizeMismatch {
                    expected: info.length(),
                    got: items.len(),
                });
            }
            for item in items {
                encode_fixed(b, item, element)?;
            }
            Ok(())
        }
        _ => Err(mismatch(value, info)),
    }
}

/// Encodes a variable value as a field: its payload goes to the heap
/// behind an offset slot.
pub(crate) fn encode_variable_field(b: &mut Builder, value: &Value, info: &TypeInfo) -> Result<()> {
    if value.is_null() {
        return Err(SszError::UnsupportedType(
            "null value in variable field".into(),
        ));
    }
    match (info.kind(), value) {
        // Flat byte payloads go straight to the heap.
        (TypeKind::List, Value::Bytes(bytes)) => {
            check_limit(info.length(), bytes.len())?;
            b.write_bytes(bytes);
            Ok(())
        }
        (TypeKind::Str, Value::Text(text)) => {
            b.write_bytes(text.as_bytes());
            Ok(())
        }
        (TypeKind::BitList, Value::Bytes(bytes)) => {
            let encoded = bits::encode_bitlist(bytes, info.bit_length())?;
            b.write_bytes(&encoded);
            Ok(())
        }
        // Structured payloads resolve in a nested scope.
        (TypeKind::List, Value::List(_) | Value::Vector(_))
        | (TypeKind::Container, _)
        | (TypeKind::Vector, _) => {
            b.enter_variable();
            encode_variable_body(b, value, info)?;
            b.exit_variable()
        }
        _ => Err(mismatch(value, info)),
    }
}

/// Encodes a variable value's canonical body into the current scope.
pub(crate) fn encode_variable_body(b: &mut Builder, value: &Value, info: &TypeInfo) -> Result<()> {
    match info.kind() {
        TypeKind::List => encode_list_body(b, value, info),
        TypeKind::Str => match value {
            Value::Text(text) => {
                b.write_fixed(text.as_bytes());
                Ok(())
            }
            _ => Err(mismatch(value, info)),
        },
        TypeKind::BitList => {
            let bytes = value.as_bytes().ok_or_else(|| mismatch(value, info))?;
            let encoded = bits::encode_bitlist(bytes, info.bit_length())?;
            b.write_fixed(&encoded);
            Ok(())
        }
        TypeKind::Container => encode_container_body(b, value, info),
        // A vector of variable elements: element offsets plus payloads,
        // like a list but with the declared element count.
        TypeKind::Vector => match value {
            Value::Vector(items) | Value::List(items) => {
                if items.len() != info.length() {
                    return Err(SszError::SizeMismatch {
                        expected: info.length(),
                        got: items.len(),
                    });
                }
                let element = info.element().expect("vectors resolve with an element");
                for item in items {
                    encode_variable_field(b, item, element)?;
                }
                Ok(())
            }
            _ => Err(mismatch(value, info)),
        },
        other => Err(SszError::UnsupportedType(format!(
            "{other} in variable position"
        ))),
    }
}

fn encode_list_body(b: &mut Builder, value: &Value, info: &TypeInfo) -> Result<()> {
    let element = info.element().expect("lists resolve with an element");
    match value {
        Value::Bytes(bytes) if element.kind() == TypeKind::Uint8 => {
            check_limit(info.length(), bytes.len())?;
            b.write_fixed(bytes);
            Ok(())
        }
        Value::List(items) | Value::Vector(items) => {
            check_limit(info.length(), items.len())?;
            if element.is_variable() {
                for item in items {
                    encode_variable_field(b, item, element)?;
                }
            } else {
                for item in items {
                    encode_fixed(b, item, element)?;
                }
            }
            Ok(())
        }
        _ => Err(mismatch(value, info)),
    }
}

fn encode_container_body(b: &mut Builder, value: &Value, info: &TypeInfo) -> Result<()> {
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
    for (field, val) in info.fields().iter().zip(values) {
        let result = if field.info().is_variable() {
            encode_variable_field(b, val, field.info())
        } else {
            encode_fixed(b, val, field.info())
        };
        result.map_err(|e| e.at(field.name().to_owned()))?;
    }
    Ok(())
}

fn check_limit(limit: usize, got: usize) -> Result<()> {
    if limit > 0 && got > limit {
        return Err(SszError::LimitExceeded { limit, got });
    }
    Ok(())
}
