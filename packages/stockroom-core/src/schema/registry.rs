use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::ResourceSchema;
use crate::error::{GridError, Result};

/// Registry of resource schemas.
///
/// Stores registered schemas with lookup by resource name.
/// Provides thread-safe registration and retrieval.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<ResourceSchema>>>,
}

impl SchemaRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a schema.
    ///
    /// # Returns
    /// `Ok(())` if successful, `Err(GridError::ResourceAlreadyRegistered)` if
    /// a schema with the same name exists.
    pub fn register(&self, schema: ResourceSchema) -> Result<()> {
        let mut schemas = self
            .schemas
            .write()
            .map_err(|_| GridError::LockPoisoned)?;

        if schemas.contains_key(&schema.name) {
            return Err(GridError::ResourceAlreadyRegistered(schema.name.clone()));
        }

        tracing::debug!(resource = %schema.name, fields = schema.fields.len(), "registered schema");
        schemas.insert(schema.name.clone(), Arc::new(schema));
        Ok(())
    }

    /// Retrieves a schema by resource name.
    pub fn get(&self, name: &str) -> Result<Arc<ResourceSchema>> {
        let schemas = self.schemas.read().map_err(|_| GridError::LockPoisoned)?;
        schemas
            .get(name)
            .cloned()
            .ok_or_else(|| GridError::ResourceNotFound {
                resource: name.to_string(),
            })
    }

    /// Checks if a resource is registered.
    pub fn contains(&self, name: &str) -> bool {
        match self.schemas.read() {
            Ok(guard) => guard.contains_key(name),
            Err(_) => false,
        }
    }

    /// Returns all registered resource names, sorted.
    pub fn names(&self) -> Vec<String> {
        let schemas = match self.schemas.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        let mut names: Vec<String> = schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// Removes a schema.
    ///
    /// # Returns
    /// `true` if the schema was removed, `false` if it wasn't found.
    pub fn remove(&self, name: &str) -> bool {
        match self.schemas.write() {
            Ok(mut guard) => guard.remove(name).is_some(),
            Err(_) => false,
        }
    }
}
