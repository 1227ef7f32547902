//! Named-type catalog with a resolved-type cache.
//!
//! A [`Schema`] owns the reference map consulted by `Ref` fields and caches
//! the [`TypeInfo`](crate::typeinfo::TypeInfo) produced for each top-level
//! name. Reads take the reader lock; the first resolution of a name takes
//! the writer lock to insert. Losing a resolution race costs an idempotent
//! recomputation, never an inconsistency.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::{Result, SszError};
use crate::schema::Field;
use crate::typeinfo::{self, TypeInfo};

/// A set of named top-level type definitions plus the cache of their
/// resolved forms. Threaded through every entry point that resolves refs.
#[derive(Debug, Default)]
pub struct Schema {
    types: HashMap<String, Field>,
    cache: RwLock<HashMap<String, Arc<TypeInfo>>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schema from top-level definitions, keyed by field name.
    pub fn with_types(types: Vec<Field>) -> Self {
        let mut schema = Self::new();
        for field in types {
            schema.define(field);
        }
        schema
    }

    /// Adds or replaces a named type. Invalidates the resolved-type cache,
    /// since existing entries may reference the replaced definition.
    pub fn define(&mut self, field: Field) {
        self.types.insert(field.name.clone(), field);
        self.cache.get_mut().clear();
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolves a named top-level type, caching the result.
    pub fn resolve(&self, name: &str) -> Result<Arc<TypeInfo>> {
        typeinfo::resolve_named(self, name, 0)
    }

    /// Resolves an anonymous field against this schema's references.
    /// Anonymous roots are not cached; named types reached through refs
    /// still share cached nodes.
    pub fn resolve_field(&self, field: &Field) -> Result<Arc<TypeInfo>> {
        typeinfo::resolve_field(self, field, 0)
    }

    /// Validates and resolves every named type eagerly. Useful at startup
    /// to surface schema mistakes before any value is marshalled.
    pub fn precache(&self) -> Result<()> {
        for (name, field) in &self.types {
            field.validate(self)?;
            self.resolve(name)?;
        }
        Ok(())
    }

    pub(crate) fn cached(&self, name: &str) -> Option<Arc<TypeInfo>> {
        self.cache.read().get(name).cloned()
    }

    pub(crate) fn insert_cached(&self, name: &str, info: Arc<TypeInfo>) {
        self.cache.write().insert(name.to_owned(), info);
    }

    pub(crate) fn lookup(&self, referrer: &str, name: &str) -> Result<&Field> {
        self.types.get(name).ok_or_else(|| {
            SszError::InvalidSchema(format!(
                "field '{referrer}' references type '{name}' which is not found"
            ))
        })
    }
}
