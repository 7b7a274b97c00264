//! Dotted field path descriptors (`serial`, `product.sku`).

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{GridError, Result};

/// Maximum number of segments in a path (one level of nesting).
const MAX_SEGMENTS: usize = 2;

/// Path to a field within a record, nested at most one level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a dotted accessor.
    ///
    /// # Arguments
    /// * `raw` - Path such as `total_cost` or `product.sku`
    ///
    /// # Returns
    /// `Result<FieldPath, GridError>` with `InvalidPath` for empty segments
    /// or nesting deeper than one level.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.len() > MAX_SEGMENTS || segments.iter().any(|s| s.trim().is_empty()) {
            return Err(GridError::InvalidPath(raw.to_string()));
        }
        Ok(Self { segments })
    }

    /// Top-level key of the record this path lives under.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// Last segment of the path.
    pub fn leaf(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Returns true for `parent.child` paths.
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Reads the value at this path.
    pub fn get<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a Value> {
        let top = record.get(self.root())?;
        if self.is_nested() {
            top.as_object()?.get(self.leaf())
        } else {
            Some(top)
        }
    }

    /// Writes the value at this path and returns the previous value.
    ///
    /// For nested paths the parent object is created when missing or when it
    /// currently holds a non-object value.
    pub fn set(&self, record: &mut Map<String, Value>, value: Value) -> Option<Value> {
        if !self.is_nested() {
            return record.insert(self.root().to_string(), value);
        }
        let parent = record
            .entry(self.root().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !parent.is_object() {
            *parent = Value::Object(Map::new());
        }
        match parent {
            Value::Object(map) => map.insert(self.leaf().to_string(), value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::str::FromStr for FieldPath {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
