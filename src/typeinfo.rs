//! # Resolved Type Information
//!
//! [`TypeInfo`] is the post-resolution form of a schema [`Field`]: refs are
//! chased, container layouts are computed, and the fixed/variable
//! classification is settled once. The codec and the hasher never look at
//! raw fields; they walk `TypeInfo` DAGs.
//!
//! ## Container Layout
//!
//! Each fixed field occupies its width at a precomputed byte offset in the
//! container's fixed part. Each variable field occupies a 4-byte offset
//! slot instead (`offset = None`), and its payload is deferred to the heap
//! section. A container with any variable field is itself variable and has
//! no static size.
//!
//! ## Sharing and Caching
//!
//! Nodes are shared (`Arc`) wherever two fields resolve to the same named
//! type; the per-[`Schema`] cache keys on the type name. Anonymous interior
//! nodes carry tag context of their own and are deliberately not cached to
//! avoid aliasing miscaches.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SszError};
use crate::schema::{Field, Schema, TypeKind, MAX_RESOLVE_DEPTH};

/// Fully resolved type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub(crate) kind: TypeKind,
    /// Serialized width in bytes; `None` for variable-size types.
    pub(crate) fixed_size: Option<usize>,
    /// Container fields in declaration order.
    pub(crate) fields: Vec<FieldInfo>,
    /// Element type for vectors and lists.
    pub(crate) element: Option<Arc<TypeInfo>>,
    /// Vector size or list element limit (0 = unbounded).
    pub(crate) length: usize,
    /// Bit-vector size or bit-list maximum, in bits.
    pub(crate) bit_length: usize,
}

/// One resolved container field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub(crate) name: String,
    pub(crate) info: Arc<TypeInfo>,
    /// Byte offset within the container's fixed part; `None` for variable
    /// fields, which occupy a 4-byte offset slot instead.
    pub(crate) offset: Option<usize>,
}

impl FieldInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &Arc<TypeInfo> {
        &self.info
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}

impl TypeInfo {
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn fixed_size(&self) -> Option<usize> {
        self.fixed_size
    }

    pub fn is_variable(&self) -> bool {
        self.fixed_size.is_none()
    }

    pub fn is_basic(&self) -> bool {
        self.kind.is_basic()
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn element(&self) -> Option<&Arc<TypeInfo>> {
        self.element.as_ref()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    /// The span of the container's fixed part: fixed widths plus 4 bytes
    /// per variable field. Defined for fixed containers by `fixed_size`;
    /// this form also covers variable containers.
    pub fn fixed_span(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.info.fixed_size.unwrap_or(crate::BYTES_PER_LENGTH_OFFSET))
            .sum()
    }

    fn basic(kind: TypeKind) -> Self {
        TypeInfo {
            kind,
            fixed_size: kind.basic_size(),
            fields: Vec::new(),
            element: None,
            length: 0,
            bit_length: 0,
        }
    }
}

pub(crate) fn resolve_named(schema: &Schema, name: &str, depth: usize) -> Result<Arc<TypeInfo>> {
    if depth >= MAX_RESOLVE_DEPTH {
        return Err(SszError::CircularReference(name.to_owned()));
    }
    if let Some(info) = schema.cached(name) {
        return Ok(info);
    }
    let field = schema
        .get(name)
        .ok_or_else(|| SszError::InvalidSchema(format!("type '{name}' not found")))?;
    let info = resolve_field(schema, field, depth + 1)?;
    debug!(name, variable = info.is_variable(), "resolved ssz type");
    schema.insert_cached(name, info.clone());
    Ok(info)
}

pub(crate) fn resolve_field(schema: &Schema, field: &Field, depth: usize) -> Result<Arc<TypeInfo>> {
    if depth >= MAX_RESOLVE_DEPTH {
        return Err(SszError::CircularReference(field.name().to_owned()));
    }
    match field.kind() {
        kind if kind.is_basic() => Ok(Arc::new(TypeInfo::basic(kind))),

        TypeKind::Str => Ok(Arc::new(TypeInfo {
            kind: TypeKind::Str,
            fixed_size: None,
            fields: Vec::new(),
            element: None,
            length: 0,
            bit_length: 0,
        })),

        TypeKind::Vector => {
            let size = require_size(field)?;
            let element = resolve_element(schema, field, depth)?;
            let fixed_size = element.fixed_size.map(|elem| size * elem);
            Ok(Arc::new(TypeInfo {
                kind: TypeKind::Vector,
                fixed_size,
                fields: Vec::new(),
                element: Some(element),
                length: size,
                bit_length: 0,
            }))
        }

        TypeKind::List => {
            let limit = require_limit(field)?;
            let element = resolve_element(schema, field, depth)?;
            Ok(Arc::new(TypeInfo {
                kind: TypeKind::List,
                fixed_size: None,
                fields: Vec::new(),
                element: Some(element),
                length: limit,
                bit_length: 0,
            }))
        }

        TypeKind::BitVector => {
            let size = require_size(field)?;
            Ok(Arc::new(TypeInfo {
                kind: TypeKind::BitVector,
                fixed_size: Some(size.div_ceil(8)),
                fields: Vec::new(),
                element: None,
                length: 0,
                bit_length: size,
            }))
        }

        TypeKind::BitList => {
            let limit = require_limit(field)?;
            Ok(Arc::new(TypeInfo {
                kind: TypeKind::BitList,
                fixed_size: None,
                fields: Vec::new(),
                element: None,
                length: 0,
                bit_length: limit,
            }))
        }

        TypeKind::Container => resolve_container(schema, field, depth),

        TypeKind::Ref => {
            let target = field.ref_name().unwrap_or("");
            if target.is_empty() {
                return Err(SszError::InvalidSchema(format!(
                    "field '{}' has type 'ref' but no ref specified",
                    field.name()
                )));
            }
            schema.lookup(field.name(), target)?;
            resolve_named(schema, target, depth + 1)
        }

        TypeKind::Union => Err(SszError::UnsupportedType("union".into())),

        _ => Err(SszError::UnsupportedType(field.kind().to_string())),
    }
}

fn resolve_container(schema: &Schema, field: &Field, depth: usize) -> Result<Arc<TypeInfo>> {
    let mut fields = Vec::with_capacity(field.children().len());
    let mut span = 0usize;
    let mut has_variable = false;

    for child in field.children() {
        if child.is_skipped() {
            continue;
        }
        let info = resolve_field(schema, child, depth + 1)
            .map_err(|e| e.at(format!("field '{}'", child.name())))?;
        let offset = match info.fixed_size {
            Some(size) => {
                let at = span;
                span += size;
                Some(at)
            }
            None => {
                span += crate::BYTES_PER_LENGTH_OFFSET;
                has_variable = true;
                None
            }
        };
        fields.push(FieldInfo {
            name: child.name().to_owned(),
            info,
            offset,
        });
    }

    if fields.is_empty() {
        return Err(SszError::InvalidSchema(format!(
            "container '{}' has no encodable fields",
            field.name()
        )));
    }

    Ok(Arc::new(TypeInfo {
        kind: TypeKind::Container,
        fixed_size: if has_variable { None } else { Some(span) },
        fields,
        element: None,
        length: 0,
        bit_length: 0,
    }))
}

fn resolve_element(schema: &Schema, field: &Field, depth: usize) -> Result<Arc<TypeInfo>> {
    let child = field.children().first().ok_or_else(|| {
        SszError::InvalidSchema(format!(
            "field '{}' of type '{}' requires an element type",
            field.name(),
            field.kind()
        ))
    })?;
    resolve_field(schema, child, depth + 1)
}

fn require_size(field: &Field) -> Result<usize> {
    match field.size() {
        Some(size) if size > 0 => Ok(size as usize),
        _ => Err(SszError::InvalidSchema(format!(
            "field '{}' of type '{}' must have non-zero size",
            field.name(),
            field.kind()
        ))),
    }
}

fn require_limit(field: &Field) -> Result<usize> {
    match field.limit() {
        Some(limit) if limit > 0 => Ok(limit as usize),
        _ => Err(SszError::InvalidSchema(format!(
            "field '{}' of type '{}' must have non-zero limit",
            field.name(),
            field.kind()
        ))),
    }
}
