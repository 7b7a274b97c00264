//! Resource tables held in memory.
//!
//! Records are stored flat: relation fields hold the related `pk`, and are
//! expanded into the related record whenever a record leaves the store.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use thiserror::Error;

use stockroom_core::value::{relation_pk, to_query_value, PK_FIELD};
use stockroom_core::{
    FieldKind, FieldPath, GridError, ListQuery, Page, Pk, ResourceSchema, Row, SchemaRegistry,
};

/// Errors returned by store operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Resource '{resource}' not found")]
    ResourceNotFound { resource: String },

    #[error("Record {pk} not found in '{resource}'")]
    RecordNotFound { resource: String, pk: Pk },

    #[error("Field '{field}' does not exist on '{resource}'")]
    UnknownField { resource: String, field: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Related record {pk} not found in '{resource}'")]
    MissingRelated { resource: String, pk: Pk },

    #[error("Invalid seed data: {0}")]
    Seed(String),

    #[error(transparent)]
    Schema(#[from] GridError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Records of one resource keyed by `pk`.
#[derive(Debug)]
struct Table {
    schema: Arc<ResourceSchema>,
    records: BTreeMap<Pk, Map<String, Value>>,
    next_pk: Pk,
}

impl Table {
    fn new(schema: Arc<ResourceSchema>) -> Self {
        Self {
            schema,
            records: BTreeMap::new(),
            next_pk: 1,
        }
    }

    /// Related resource and display field of a top-level relation field.
    fn relation(&self, root: &str) -> Option<(&str, &str)> {
        self.schema.fields.iter().find_map(|def| match &def.kind {
            FieldKind::Relation { resource, display }
                if !def.path.is_nested() && def.path.root() == root =>
            {
                Some((resource.as_str(), display.as_str()))
            }
            _ => None,
        })
    }

    /// Top-level field accepting writes (some editable field lives under it).
    fn is_writable(&self, root: &str) -> bool {
        self.schema
            .fields
            .iter()
            .any(|def| def.editable && def.path.root() == root)
    }

    fn kind_of(&self, root: &str) -> Option<&FieldKind> {
        self.schema
            .fields
            .iter()
            .find(|def| !def.path.is_nested() && def.path.root() == root)
            .map(|def| &def.kind)
    }

    /// Paths matched by `search`: text fields and relation display fields.
    fn search_paths(&self) -> Vec<FieldPath> {
        self.schema
            .fields
            .iter()
            .filter_map(|def| match &def.kind {
                FieldKind::Text => Some(def.path.clone()),
                FieldKind::Relation { display, .. } => {
                    FieldPath::parse(&format!("{}.{}", def.path.root(), display)).ok()
                }
                _ => None,
            })
            .collect()
    }

    fn insert(&mut self, pk: Pk, mut record: Map<String, Value>) {
        record.insert(PK_FIELD.to_string(), Value::from(pk));
        self.records.insert(pk, record);
        self.next_pk = self.next_pk.max(pk.saturating_add(1));
    }
}

/// In-memory store with one table per registered resource.
#[derive(Debug)]
pub struct Store {
    tables: RwLock<HashMap<String, Table>>,
}

impl Store {
    /// Creates an empty table for every resource in the registry.
    pub fn from_registry(registry: &SchemaRegistry) -> Result<Self> {
        let mut tables = HashMap::new();
        for name in registry.names() {
            let schema = registry.get(&name)?;
            tables.insert(name, Table::new(schema));
        }
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Names of all resources, sorted.
    pub fn resources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of records stored for a resource.
    pub fn len(&self, resource: &str) -> Result<usize> {
        let tables = self.tables.read();
        Ok(table(&tables, resource)?.records.len())
    }

    /// Inserts seed records.
    ///
    /// # Arguments
    /// * `data` - Object mapping resource names to arrays of records.
    ///   Records keep a given `pk`; others are assigned the next free one.
    ///   Relation fields may hold a `pk` or an object carrying one.
    ///
    /// # Returns
    /// The number of records inserted.
    pub fn seed(&self, data: Map<String, Value>) -> Result<usize> {
        let mut tables = self.tables.write();
        let mut inserted = 0;

        for (resource, records) in data {
            let table = tables
                .get_mut(&resource)
                .ok_or_else(|| StoreError::ResourceNotFound {
                    resource: resource.clone(),
                })?;
            let Value::Array(records) = records else {
                return Err(StoreError::Seed(format!("'{}' must be an array", resource)));
            };

            for record in records {
                let Value::Object(mut record) = record else {
                    return Err(StoreError::Seed(format!(
                        "records of '{}' must be objects",
                        resource
                    )));
                };
                let pk = match record.remove(PK_FIELD) {
                    // The largest pk would leave no pk to assign next
                    Some(value) => value.as_u64().filter(|pk| *pk < Pk::MAX).ok_or_else(|| {
                        StoreError::Seed(format!("invalid pk {} in '{}'", value, resource))
                    })?,
                    None => table.next_pk,
                };
                let roots: Vec<String> = record.keys().cloned().collect();
                for root in roots {
                    if table.relation(&root).is_some() {
                        if let Some(value) = record.get_mut(&root) {
                            if let Some(related) = relation_pk(value) {
                                *value = Value::from(related);
                            }
                        }
                    }
                }
                table.insert(pk, record);
                inserted += 1;
            }
        }

        tracing::info!(records = inserted, "store seeded");
        Ok(inserted)
    }

    /// Reads seed records from a JSON file (see [`Store::seed`]).
    pub fn load_seed_file(&self, path: &Path) -> Result<usize> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(data)) => self.seed(data),
            Ok(_) => Err(StoreError::Seed(format!(
                "{}: top level must be an object",
                path.display()
            ))),
            Err(e) => Err(StoreError::Seed(format!("{}: {}", path.display(), e))),
        }
    }

    /// Lists one page of records.
    ///
    /// Filters compare the rendered value at a dotted path (relations by
    /// `pk`), `search` matches text and relation display fields
    /// case-insensitively, and ordering keys on relations sort by the
    /// related display field. Filters and ordering keys naming unknown
    /// fields are ignored. Ties are broken by `pk`.
    pub fn list(&self, resource: &str, query: &ListQuery) -> Result<Page> {
        let tables = self.tables.read();
        let table = table(&tables, resource)?;

        let mut records: Vec<Map<String, Value>> = table
            .records
            .values()
            .map(|record| expand(&tables, table, record))
            .collect();

        for (key, expected) in &query.filters {
            let path = FieldPath::parse(key)?;
            if !table.schema.has_root(path.root()) {
                tracing::debug!(resource, filter = %key, "unknown filter ignored");
                continue;
            }
            records.retain(|record| filter_matches(record, &path, expected));
        }

        if let Some(term) = &query.search {
            let term = term.to_lowercase();
            let paths = table.search_paths();
            records.retain(|record| {
                paths.iter().any(|path| {
                    path.get(record)
                        .and_then(Value::as_str)
                        .is_some_and(|text| text.to_lowercase().contains(&term))
                })
            });
        }

        let mut keys = Vec::new();
        for key in &query.ordering {
            let path = FieldPath::parse(&key.field)?;
            if !table.schema.has_root(path.root()) {
                continue;
            }
            let path = match table.relation(path.root()) {
                Some((_, display)) if !path.is_nested() => {
                    FieldPath::parse(&format!("{}.{}", path.root(), display))?
                }
                _ => path,
            };
            keys.push((path, key.descending));
        }
        records.sort_by(|a, b| {
            for (path, descending) in &keys {
                let ordering = compare_values(path.get(a), path.get(b));
                let ordering = if *descending {
                    ordering.reverse()
                } else {
                    ordering
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            pk_of(a).cmp(&pk_of(b))
        });

        let count = records.len() as u64;
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        let results = records
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(Row::from_map)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Page { count, results })
    }

    /// Creates a record and assigns its `pk`.
    ///
    /// Read-only fields (including `pk`) are ignored. Returns the stored
    /// record with relations expanded.
    pub fn create(&self, resource: &str, body: Map<String, Value>) -> Result<Value> {
        let mut tables = self.tables.write();
        let record = {
            let table = table(&tables, resource)?;
            let mut record = Map::new();
            for (root, value) in body {
                if !table.schema.has_root(&root) {
                    return Err(StoreError::UnknownField {
                        resource: resource.to_string(),
                        field: root,
                    });
                }
                if !table.is_writable(&root) {
                    continue;
                }
                let value = normalize(&tables, table, &root, value)?;
                record.insert(root, value);
            }
            record
        };

        let table = table_mut(&mut tables, resource)?;
        let pk = table.next_pk;
        table.insert(pk, record);
        tracing::debug!(resource, pk, "record created");
        read_expanded(&tables, resource, pk)
    }

    /// Returns one record with relations expanded.
    pub fn read(&self, resource: &str, pk: Pk) -> Result<Value> {
        let tables = self.tables.read();
        read_expanded(&tables, resource, pk)
    }

    /// Applies a partial update.
    ///
    /// Read-only fields in the body are ignored, so the returned record
    /// echoes their stored value. Objects sent for non-relation fields are
    /// merged into the stored object.
    pub fn update(&self, resource: &str, pk: Pk, body: Map<String, Value>) -> Result<Value> {
        let mut tables = self.tables.write();
        let mut changes = Vec::new();
        {
            let table = table(&tables, resource)?;
            if !table.records.contains_key(&pk) {
                return Err(StoreError::RecordNotFound {
                    resource: resource.to_string(),
                    pk,
                });
            }
            for (root, value) in body {
                if !table.schema.has_root(&root) {
                    return Err(StoreError::UnknownField {
                        resource: resource.to_string(),
                        field: root,
                    });
                }
                if !table.is_writable(&root) {
                    tracing::debug!(resource, pk, field = %root, "read-only field ignored");
                    continue;
                }
                let value = normalize(&tables, table, &root, value)?;
                changes.push((root, value));
            }
        }

        let table = table_mut(&mut tables, resource)?;
        if let Some(record) = table.records.get_mut(&pk) {
            for (root, value) in changes {
                match (record.get_mut(&root), value) {
                    (Some(Value::Object(stored)), Value::Object(incoming)) => {
                        stored.extend(incoming);
                    }
                    (_, value) => {
                        record.insert(root, value);
                    }
                }
            }
        }
        tracing::debug!(resource, pk, "record updated");
        read_expanded(&tables, resource, pk)
    }

    /// Removes a record.
    pub fn delete(&self, resource: &str, pk: Pk) -> Result<()> {
        let mut tables = self.tables.write();
        let table = table_mut(&mut tables, resource)?;
        match table.records.remove(&pk) {
            Some(_) => {
                tracing::debug!(resource, pk, "record deleted");
                Ok(())
            }
            None => Err(StoreError::RecordNotFound {
                resource: resource.to_string(),
                pk,
            }),
        }
    }
}

fn table<'a>(tables: &'a HashMap<String, Table>, resource: &str) -> Result<&'a Table> {
    tables
        .get(resource)
        .ok_or_else(|| StoreError::ResourceNotFound {
            resource: resource.to_string(),
        })
}

fn table_mut<'a>(tables: &'a mut HashMap<String, Table>, resource: &str) -> Result<&'a mut Table> {
    tables
        .get_mut(resource)
        .ok_or_else(|| StoreError::ResourceNotFound {
            resource: resource.to_string(),
        })
}

fn read_expanded(tables: &HashMap<String, Table>, resource: &str, pk: Pk) -> Result<Value> {
    let table = table(tables, resource)?;
    let record = table
        .records
        .get(&pk)
        .ok_or_else(|| StoreError::RecordNotFound {
            resource: resource.to_string(),
            pk,
        })?;
    Ok(Value::Object(expand(tables, table, record)))
}

/// Replaces relation identifiers with the related records.
fn expand(
    tables: &HashMap<String, Table>,
    table: &Table,
    record: &Map<String, Value>,
) -> Map<String, Value> {
    let mut expanded = record.clone();
    for (root, value) in expanded.iter_mut() {
        let Some((related, _)) = table.relation(root) else {
            continue;
        };
        let target = value
            .as_u64()
            .and_then(|pk| tables.get(related)?.records.get(&pk));
        if let Some(target) = target {
            *value = Value::Object(target.clone());
        }
    }
    expanded
}

/// Checks an incoming value and converts relation values to a bare `pk`.
fn normalize(
    tables: &HashMap<String, Table>,
    table: &Table,
    root: &str,
    value: Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }

    if let Some((related, _)) = table.relation(root) {
        let pk = relation_pk(&value).ok_or_else(|| StoreError::InvalidValue {
            field: root.to_string(),
            message: format!("expected a pk, got {}", value),
        })?;
        let exists = tables
            .get(related)
            .is_some_and(|t| t.records.contains_key(&pk));
        if !exists {
            return Err(StoreError::MissingRelated {
                resource: related.to_string(),
                pk,
            });
        }
        return Ok(Value::from(pk));
    }

    match table.kind_of(root) {
        Some(kind) if !kind.accepts(&value) => Err(StoreError::InvalidValue {
            field: root.to_string(),
            message: format!("expected {}, got {}", kind.name(), value),
        }),
        _ => Ok(value),
    }
}

fn filter_matches(record: &Map<String, Value>, path: &FieldPath, expected: &str) -> bool {
    match path.get(record) {
        Some(value) => match relation_pk(value) {
            Some(pk) if value.is_object() => pk.to_string() == expected,
            _ => to_query_value(value) == expected,
        },
        None => false,
    }
}

fn pk_of(record: &Map<String, Value>) -> Pk {
    record.get(PK_FIELD).and_then(Value::as_u64).unwrap_or(0)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(v) if numeric(v).is_some() => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    }
}

/// Orders cell values: missing and null first, then booleans, numbers
/// (numeric strings included) and case-insensitive text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    if let (Some(x), Some(y)) = (a.and_then(numeric), b.and_then(numeric)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    })
}
