//! Resource schemas: the typed shape of one REST collection.

mod builtin;
mod field;
mod path;
mod registry;

pub use builtin::register_builtin_schemas;
pub use field::{FieldDef, FieldKind, FieldRef};
pub use path::FieldPath;
pub use registry::SchemaRegistry;

use crate::error::{GridError, Result};
use crate::query::SortKey;
use crate::value::PK_FIELD;

/// Schema of one resource (REST collection) shown as a table.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    /// Collection path segment (e.g. `inventory`)
    pub name: String,
    /// Field definitions in column order
    pub fields: Vec<FieldDef>,
    /// Ordering applied when a view does not choose one
    pub default_ordering: Vec<SortKey>,
}

impl ResourceSchema {
    /// Creates a schema holding only the read-only `pk` column.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: vec![FieldDef::new(PK_FIELD, FieldKind::Integer)
                .read_only()
                .label("ID")],
            default_ordering: Vec::new(),
        }
    }

    /// Appends a column.
    ///
    /// # Returns
    /// `Err(GridError::FieldAlreadyExists)` if the path is already declared.
    pub fn with_field(mut self, def: FieldDef) -> Result<Self> {
        if self.fields.iter().any(|f| f.path == def.path) {
            return Err(GridError::FieldAlreadyExists {
                resource: self.name.clone(),
                field: def.path.to_string(),
            });
        }
        self.fields.push(def);
        Ok(self)
    }

    /// Sets the default ordering.
    pub fn ordered_by(mut self, ordering: Vec<SortKey>) -> Self {
        self.default_ordering = ordering;
        self
    }

    /// Resolves a dotted path against this schema.
    ///
    /// # Arguments
    /// * `path` - Field path such as `total_cost` or `product.sku`
    ///
    /// # Returns
    /// `Result<FieldRef, GridError>` containing the resolved field.
    pub fn field(&self, path: &str) -> Result<FieldRef> {
        let parsed = FieldPath::parse(path)?;
        self.fields
            .iter()
            .find(|f| f.path == parsed)
            .map(|def| FieldRef::new(&self.name, def))
            .ok_or_else(|| GridError::FieldNotFound {
                resource: self.name.clone(),
                field: path.to_string(),
            })
    }

    /// Returns true if a top-level key is declared by some column.
    pub fn has_root(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.path.root() == key)
    }

    /// Returns the fields that relate to other resources.
    pub fn relations(&self) -> impl Iterator<Item = FieldRef> + '_ {
        self.fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Relation { .. }))
            .map(|def| FieldRef::new(&self.name, def))
    }
}
