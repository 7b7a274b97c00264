//! Field definitions within a resource schema.

use serde_json::Value;

use super::path::FieldPath;
use crate::error::{GridError, Result};
use crate::value::kind_name;

/// Value kind of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    /// Numbers or numeric strings (decimals are serialized as strings)
    Decimal,
    Text,
    Boolean,
    /// ISO-8601 date string
    Date,
    /// Foreign key shown by a display field of the related resource.
    Relation {
        /// Related resource name (e.g. `rooms`)
        resource: String,
        /// Field of the related record shown in the cell (e.g. `name`)
        display: String,
    },
}

impl FieldKind {
    /// Shorthand for a relation kind.
    pub fn relation(resource: &str, display: &str) -> Self {
        FieldKind::Relation {
            resource: resource.to_string(),
            display: display.to_string(),
        }
    }

    /// Checks whether an edited cell value fits this kind.
    ///
    /// `null` is accepted everywhere. Relation cells are edited by display
    /// name, so they accept strings.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Decimal => match value {
                Value::Number(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            },
            FieldKind::Text | FieldKind::Date => value.is_string(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Relation { .. } => value.is_string(),
        }
    }

    /// Human readable kind name.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Decimal => "decimal",
            FieldKind::Text => "text",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Relation { .. } => "relation",
        }
    }
}

/// Column declaration.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Path of the value within a record
    pub path: FieldPath,
    /// Value kind
    pub kind: FieldKind,
    /// Whether the dashboard lets users edit the cell
    pub editable: bool,
    /// Column header
    pub label: String,
}

impl FieldDef {
    /// Creates an editable field labelled by its path.
    ///
    /// # Panics
    /// Panics if `path` is not a valid field path. Schemas are declared in
    /// code, so a bad literal is a programming error.
    pub fn new(path: &str, kind: FieldKind) -> Self {
        let path = match FieldPath::parse(path) {
            Ok(path) => path,
            Err(e) => panic!("invalid field declaration: {}", e),
        };
        Self {
            label: path.to_string(),
            path,
            kind,
            editable: true,
        }
    }

    /// Marks the field as read-only.
    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Overrides the column header.
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }
}

/// Field resolved against a schema.
///
/// Obtained once from [`super::ResourceSchema::field`]; holding one means the
/// path exists in the schema, so later accesses do not re-validate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    resource: String,
    path: FieldPath,
    kind: FieldKind,
    editable: bool,
}

impl FieldRef {
    pub(crate) fn new(resource: &str, def: &FieldDef) -> Self {
        Self {
            resource: resource.to_string(),
            path: def.path.clone(),
            kind: def.kind.clone(),
            editable: def.editable,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Returns the related resource and display field for relation columns.
    pub fn relation(&self) -> Option<(&str, &str)> {
        match &self.kind {
            FieldKind::Relation { resource, display } => Some((resource, display)),
            _ => None,
        }
    }

    /// Rejects edits of identifier and derived columns.
    ///
    /// Called by front ends before offering a cell for editing.
    pub fn ensure_editable(&self) -> Result<()> {
        if self.editable {
            Ok(())
        } else {
            Err(GridError::FieldReadOnly {
                resource: self.resource.clone(),
                field: self.path.to_string(),
            })
        }
    }

    /// Type-checks an edited value against the field kind.
    pub fn check_value(&self, value: &Value) -> Result<()> {
        if self.kind.accepts(value) {
            Ok(())
        } else {
            Err(GridError::TypeMismatch {
                field: self.path.to_string(),
                expected: self.kind.name().to_string(),
                got: kind_name(value).to_string(),
            })
        }
    }
}
