//! Field definitions and shape validation for the SSZ type universe.

use crate::error::{Result, SszError};
use crate::schema::{Schema, MAX_RESOLVE_DEPTH};

/// The kind of an SSZ schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Uint256,
    Boolean,
    Container,
    Vector,
    List,
    BitVector,
    BitList,
    /// Unbounded byte list that round-trips as UTF-8 text.
    Str,
    Union,
    /// Schema-time indirection to a named type; all other kinds are structural.
    Ref,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Uint8 => "uint8",
            TypeKind::Uint16 => "uint16",
            TypeKind::Uint32 => "uint32",
            TypeKind::Uint64 => "uint64",
            TypeKind::Uint128 => "uint128",
            TypeKind::Uint256 => "uint256",
            TypeKind::Boolean => "boolean",
            TypeKind::Container => "container",
            TypeKind::Vector => "vector",
            TypeKind::List => "list",
            TypeKind::BitVector => "bitvector",
            TypeKind::BitList => "bitlist",
            TypeKind::Str => "string",
            TypeKind::Union => "union",
            TypeKind::Ref => "ref",
        }
    }

    /// Basic types pack directly into chunks and have a fixed width.
    pub fn is_basic(&self) -> bool {
        matches!(
            self,
            TypeKind::Uint8
                | TypeKind::Uint16
                | TypeKind::Uint32
                | TypeKind::Uint64
                | TypeKind::Uint128
                | TypeKind::Uint256
                | TypeKind::Boolean
        )
    }

    /// Width in bytes of a basic type, `None` otherwise.
    pub fn basic_size(&self) -> Option<usize> {
        match self {
            TypeKind::Uint8 | TypeKind::Boolean => Some(1),
            TypeKind::Uint16 => Some(2),
            TypeKind::Uint32 => Some(4),
            TypeKind::Uint64 => Some(8),
            TypeKind::Uint128 => Some(16),
            TypeKind::Uint256 => Some(32),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, kind-tagged schema node.
///
/// Sequence kinds (`Vector`, `List`) carry their element type as the single
/// child; containers carry one child per field in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) size: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) ref_name: Option<String>,
    pub(crate) children: Vec<Field>,
    pub(crate) skip: bool,
}

impl Field {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: None,
            limit: None,
            ref_name: None,
            children: Vec::new(),
            skip: false,
        }
    }

    pub fn uint8(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Uint8)
    }

    pub fn uint16(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Uint16)
    }

    pub fn uint32(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Uint32)
    }

    pub fn uint64(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Uint64)
    }

    pub fn uint128(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Uint128)
    }

    pub fn uint256(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Uint256)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Str)
    }

    /// Fixed-size sequence of `size` elements.
    pub fn vector(name: impl Into<String>, size: u64, element: Field) -> Self {
        let mut f = Self::new(name, TypeKind::Vector);
        f.size = Some(size);
        f.children = vec![element];
        f
    }

    /// Variable-size sequence of at most `limit` elements.
    pub fn list(name: impl Into<String>, limit: u64, element: Field) -> Self {
        let mut f = Self::new(name, TypeKind::List);
        f.limit = Some(limit);
        f.children = vec![element];
        f
    }

    /// `bytevector` alias: a vector of `uint8` of the declared size.
    pub fn bytevector(name: impl Into<String>, size: u64) -> Self {
        Self::vector(name, size, Field::uint8("element"))
    }

    /// Nested byte vectors from successive dimensions, e.g. `[8192, 32]`
    /// builds a vector of 8192 32-byte vectors.
    pub fn bytevector_dims(name: impl Into<String>, dims: &[u64]) -> Result<Self> {
        match dims {
            [] => Err(SszError::InvalidSchema(
                "size requires at least one dimension".into(),
            )),
            [size] => Ok(Self::bytevector(name, *size)),
            [size, rest @ ..] => {
                let element = Self::bytevector_dims("element", rest)?;
                Ok(Self::vector(name, *size, element))
            }
        }
    }

    /// A list of `uint8` with the declared element limit.
    pub fn bytelist(name: impl Into<String>, limit: u64) -> Self {
        Self::list(name, limit, Field::uint8("element"))
    }

    pub fn bitvector(name: impl Into<String>, size: u64) -> Self {
        let mut f = Self::new(name, TypeKind::BitVector);
        f.size = Some(size);
        f
    }

    pub fn bitlist(name: impl Into<String>, limit: u64) -> Self {
        let mut f = Self::new(name, TypeKind::BitList);
        f.limit = Some(limit);
        f
    }

    pub fn container(name: impl Into<String>, children: Vec<Field>) -> Self {
        let mut f = Self::new(name, TypeKind::Container);
        f.children = children;
        f
    }

    pub fn union(name: impl Into<String>, children: Vec<Field>) -> Self {
        let mut f = Self::new(name, TypeKind::Union);
        f.children = children;
        f
    }

    /// Indirection to the named type in the enclosing schema.
    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut f = Self::new(name, TypeKind::Ref);
        f.ref_name = Some(target.into());
        f
    }

    /// Marks the field as skipped; skipped container children are dropped
    /// from the resolved layout.
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn ref_name(&self) -> Option<&str> {
        self.ref_name.as_deref()
    }

    pub fn children(&self) -> &[Field] {
        &self.children
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    /// Validates the field and all its subfields against the schema.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        self.validate_at(schema, 0)
    }

    fn validate_at(&self, schema: &Schema, depth: usize) -> Result<()> {
        if depth >= MAX_RESOLVE_DEPTH {
            return Err(SszError::CircularReference(self.name.clone()));
        }
        if self.name.is_empty() {
            return Err(SszError::InvalidSchema("field name cannot be empty".into()));
        }
        if self.size.is_some() && self.limit.is_some() {
            return Err(SszError::InvalidSchema(format!(
                "field '{}' cannot have both size and limit",
                self.name
            )));
        }
        match self.kind {
            TypeKind::Uint8
            | TypeKind::Uint16
            | TypeKind::Uint32
            | TypeKind::Uint64
            | TypeKind::Uint128
            | TypeKind::Uint256
            | TypeKind::Boolean
            | TypeKind::Str => self.require_no_bounds(),
            TypeKind::Vector | TypeKind::BitVector => {
                if self.limit.is_some() {
                    return Err(SszError::InvalidSchema(format!(
                        "field '{}' of type '{}' takes size, not limit",
                        self.name, self.kind
                    )));
                }
                if self.size.unwrap_or(0) == 0 {
                    return Err(SszError::InvalidSchema(format!(
                        "field '{}' of type '{}' must have non-zero size",
                        self.name, self.kind
                    )));
                }
                if self.kind == TypeKind::Vector {
                    self.validate_children(schema, depth)?;
                }
                Ok(())
            }
            TypeKind::List | TypeKind::BitList => {
                if self.size.is_some() {
                    return Err(SszError::InvalidSchema(format!(
                        "field '{}' of type '{}' takes limit, not size",
                        self.name, self.kind
                    )));
                }
                if self.limit.unwrap_or(0) == 0 {
                    return Err(SszError::InvalidSchema(format!(
                        "field '{}' of type '{}' must have non-zero limit",
                        self.name, self.kind
                    )));
                }
                if self.kind == TypeKind::List {
                    self.validate_children(schema, depth)?;
                }
                Ok(())
            }
            TypeKind::Container | TypeKind::Union => {
                self.require_no_bounds()?;
                if self.children.is_empty() {
                    return Err(SszError::InvalidSchema(format!(
                        "field '{}' of type '{}' must have children",
                        self.name, self.kind
                    )));
                }
                self.validate_children(schema, depth)
            }
            TypeKind::Ref => {
                let target = self.ref_name.as_deref().unwrap_or("");
                if target.is_empty() {
                    return Err(SszError::InvalidSchema(format!(
                        "field '{}' has type 'ref' but no ref specified",
                        self.name
                    )));
                }
                let referenced = schema.get(target).ok_or_else(|| {
                    SszError::InvalidSchema(format!(
                        "field '{}' references type '{}' which is not found",
                        self.name, target
                    ))
                })?;
                referenced.validate_at(schema, depth + 1)
            }
        }
    }

    fn require_no_bounds(&self) -> Result<()> {
        if self.size.is_some() || self.limit.is_some() {
            return Err(SszError::InvalidSchema(format!(
                "field '{}' of type '{}' takes neither size nor limit",
                self.name, self.kind
            )));
        }
        Ok(())
    }

    fn validate_children(&self, schema: &Schema, depth: usize) -> Result<()> {
        for (i, child) in self.children.iter().enumerate() {
            child
                .validate_at(schema, depth + 1)
                .map_err(|e| e.at(format!("field '{}' child[{}]", self.name, i)))?;
        }
        Ok(())
    }

    /// Determines whether the field is variable-size.
    ///
    /// Lists, bit-lists, strings, and unions are always variable; vectors,
    /// bit-vectors, and containers are variable iff any descendant is
    /// variable (through refs). Everything else is fixed.
    pub fn is_variable(&self, schema: &Schema) -> Result<bool> {
        self.is_variable_at(schema, 0)
    }

    fn is_variable_at(&self, schema: &Schema, depth: usize) -> Result<bool> {
        if depth >= MAX_RESOLVE_DEPTH {
            return Err(SszError::CircularReference(self.name.clone()));
        }
        match self.kind {
            TypeKind::List | TypeKind::BitList | TypeKind::Union | TypeKind::Str => Ok(true),
            TypeKind::Container | TypeKind::Vector | TypeKind::BitVector => {
                for child in &self.children {
                    if child.is_variable_at(schema, depth + 1)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            TypeKind::Ref => {
                let target = self.ref_name.as_deref().unwrap_or("");
                if target.is_empty() {
                    return Err(SszError::InvalidSchema(format!(
                        "field '{}' has type 'ref' but no ref specified",
                        self.name
                    )));
                }
                let referenced = schema.get(target).ok_or_else(|| {
                    SszError::InvalidSchema(format!("ref type '{}' not found", target))
                })?;
                referenced.is_variable_at(schema, depth + 1)
            }
            _ => Ok(false),
        }
    }
}
