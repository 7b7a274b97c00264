//! One record of a resource.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GridError, Result};
use crate::schema::FieldPath;
use crate::value::{Pk, PK_FIELD};

/// One record as returned by the REST collaborator.
///
/// Always carries an unsigned `pk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Row {
    pk: Pk,
    fields: Map<String, Value>,
}

impl Row {
    /// Builds a row from a JSON record.
    ///
    /// # Returns
    /// `Err(GridError::MissingPk)` if the value is not an object or has no
    /// unsigned `pk`.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Self::from_map(fields),
            _ => Err(GridError::MissingPk(PK_FIELD.to_string())),
        }
    }

    /// Builds a row from a JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Result<Self> {
        let pk = fields
            .get(PK_FIELD)
            .and_then(Value::as_u64)
            .ok_or_else(|| GridError::MissingPk(PK_FIELD.to_string()))?;
        Ok(Self { pk, fields })
    }

    pub fn pk(&self) -> Pk {
        self.pk
    }

    /// Reads the value at a field path.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.fields)
    }

    /// Reads a top-level key.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Writes the value at a field path, returning the previous value.
    ///
    /// The primary key is immutable; writes to `pk` are ignored.
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Option<Value> {
        if path.root() == PK_FIELD {
            return self.fields.get(PK_FIELD).cloned();
        }
        path.set(&mut self.fields, value)
    }

    /// Removes the value at a field path, returning it.
    pub fn unset(&mut self, path: &FieldPath) -> Option<Value> {
        if path.root() == PK_FIELD {
            return None;
        }
        if path.is_nested() {
            self.fields
                .get_mut(path.root())
                .and_then(Value::as_object_mut)
                .and_then(|parent| parent.remove(path.leaf()))
        } else {
            self.fields.remove(path.root())
        }
    }

    /// Puts a top-level key back to `value`, removing it for `None`.
    ///
    /// The primary key is immutable.
    pub fn replace_key(&mut self, key: &str, value: Option<Value>) -> Option<Value> {
        if key == PK_FIELD {
            return self.fields.get(PK_FIELD).cloned();
        }
        match value {
            Some(value) => self.fields.insert(key.to_string(), value),
            None => self.fields.remove(key),
        }
    }

    /// Borrows the underlying record.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl TryFrom<Value> for Row {
    type Error = GridError;

    fn try_from(value: Value) -> Result<Self> {
        Row::from_value(value)
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        row.into_value()
    }
}
