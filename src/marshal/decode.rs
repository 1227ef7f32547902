//! Kind-directed decoding of SSZ bytes into a [`Value`].

use crate::codec::{bits, Decoder, Part};
use crate::error::{Result, SszError};
use crate::schema::TypeKind;
use crate::typeinfo::TypeInfo;
use crate::value::Value;

/// Decodes SSZ bytes into a value of the described type.
///
/// Fixed-size roots must match the declared width exactly; trailing bytes
/// are a framing error.
pub fn unmarshal(data: &[u8], info: &TypeInfo) -> Result<Value> {
    if let Some(expected) = info.fixed_size() {
        if data.len() != expected {
            return Err(SszError::SizeMismatch {
                expected,
                got: data.len(),
            });
        }
    }
    let mut decoder = Decoder::new(data);
    decode_value(&mut decoder, info)
}

pub(crate) fn decode_value(d: &mut Decoder<'_>, info: &TypeInfo) -> Result<Value> {
    if info.is_variable() {
        decode_variable(d, info)
    } else {
        decode_fixed(d, info)
    }
}

fn decode_fixed(d: &mut Decoder<'_>, info: &TypeInfo) -> Result<Value> {
    match info.kind() {
        TypeKind::Uint8 => Ok(Value::Uint8(d.read_uint8()?)),
        TypeKind::Uint16 => Ok(Value::Uint16(d.read_uint16()?)),
        TypeKind::Uint32 => Ok(Value::Uint32(d.read_uint32()?)),
        TypeKind::Uint64 => Ok(Value::Uint64(d.read_uint64()?)),
        TypeKind::Uint128 => Ok(Value::Uint128(d.read_uint128()?)),
        TypeKind::Uint256 => Ok(Value::Uint256(d.read_uint256()?)),
        TypeKind::Boolean => Ok(Value::Bool(d.read_bool()?)),
        TypeKind::BitVector => {
            let bytes = d.read_n(info.bit_length().div_ceil(8))?;
            Ok(Value::Bytes(bits::decode_bitvector(
                bytes,
                info.bit_length(),
            )?))
        }
        TypeKind::Vector => {
            let element = info.element().expect("vectors resolve with an element");
            if element.kind() == TypeKind::Uint8 {
                return Ok(Value::Bytes(d.read_n(info.length())?.to_vec()));
            }
            let mut items = Vec::with_capacity(info.length());
            for _ in 0..info.length() {
                items.push(decode_fixed(d, element)?);
            }
            Ok(Value::Vector(items))
        }
        TypeKind::Container => decode_container(d, info),
        other => Err(SszError::UnsupportedType(format!(
            "{other} in fixed position"
        ))),
    }
}

fn decode_variable(d: &mut Decoder<'_>, info: &TypeInfo) -> Result<Value> {
    match info.kind() {
        TypeKind::List => {
            let element = info.element().expect("lists resolve with an element");
            if element.kind() == TypeKind::Uint8 {
                let bytes = d.read_all();
                if info.length() > 0 && bytes.len() > info.length() {
                    return Err(SszError::LimitExceeded {
                        limit: info.length(),
                        got: bytes.len(),
                    });
                }
                return Ok(Value::Bytes(bytes.to_vec()));
            }
            let items = if element.is_variable() {
                d.decode_variable_list(info.length(), |sub| decode_value(sub, element))?
            } else {
                let elem_size = element
                    .fixed_size()
                    .expect("fixed elements have a fixed size");
                d.decode_fixed_list(elem_size, info.length(), |sub| decode_fixed(sub, element))?
            };
            Ok(Value::List(items))
        }
        TypeKind::Str => {
            let bytes = d.read_all();
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|_| SszError::UnsupportedType("non-utf-8 string payload".into()))?;
            Ok(Value::Text(text))
        }
        TypeKind::BitList => {
            let bytes = d.read_all();
            let (decoded, _num_bits) = bits::decode_bitlist(bytes, info.bit_length())?;
            Ok(Value::Bytes(decoded))
        }
        TypeKind::Container => decode_container(d, info),
        TypeKind::Vector => {
            // Vector of variable elements: offsets for the declared count.
            let element = info.element().expect("vectors resolve with an element");
            let items =
                d.decode_variable_list(info.length(), |sub| decode_value(sub, element))?;
            if items.len() != info.length() {
                return Err(SszError::SizeMismatch {
                    expected: info.length(),
                    got: items.len(),
                });
            }
            Ok(Value::Vector(items))
        }
        other => Err(SszError::UnsupportedType(format!(
            "{other} in variable position"
        ))),
    }
}

fn decode_container<'a>(d: &mut Decoder<'a>, info: &TypeInfo) -> Result<Value> {
    let parts: Vec<Part<'_, 'a, Value>> = info
        .fields()
        .iter()
        .map(|field| {
            let fi = field.info().clone();
            let name = field.name().to_owned();
            if fi.is_variable() {
                Part::variable(move |sub: &mut Decoder<'a>| {
                    decode_variable(sub, &fi).map_err(|e| e.at(name))
                })
            } else {
                Part::fixed(move |sub: &mut Decoder<'a>| {
                    decode_fixed(sub, &fi).map_err(|e| e.at(name))
                })
            }
        })
        .collect();
    Ok(Value::Container(d.decode_container(parts)?))
}
