//! Side-loaded reference lists used to resolve relation cells.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;

use stockroom_core::{FieldPath, Result, Row};

/// Small lookup list of a related resource (rooms, ratings, ...).
///
/// Loaded wholesale; a later load replaces an earlier one regardless of
/// which request was issued first.
#[derive(Debug)]
pub struct ReferenceList {
    resource: String,
    display: FieldPath,
    entries: ArcSwap<Vec<Row>>,
}

impl ReferenceList {
    /// Creates an empty list.
    ///
    /// # Arguments
    /// * `resource` - Related resource name (e.g. `rooms`)
    /// * `display` - Field shown in cells and matched by name (e.g. `name`)
    pub fn new(resource: &str, display: &str) -> Result<Self> {
        Ok(Self {
            resource: resource.to_string(),
            display: FieldPath::parse(display)?,
            entries: ArcSwap::from_pointee(Vec::new()),
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn display(&self) -> &FieldPath {
        &self.display
    }

    /// Replaces all entries.
    pub fn replace(&self, rows: Vec<Row>) {
        tracing::debug!(resource = %self.resource, entries = rows.len(), "reference list loaded");
        self.entries.store(Arc::new(rows));
    }

    /// Appends an entry, replacing one with the same `pk`.
    pub fn push(&self, row: Row) {
        self.entries.rcu(|current| {
            let mut next: Vec<Row> = current
                .iter()
                .filter(|existing| existing.pk() != row.pk())
                .cloned()
                .collect();
            next.push(row.clone());
            next
        });
    }

    /// Current entries.
    pub fn entries(&self) -> Arc<Vec<Row>> {
        self.entries.load_full()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the entry whose display field equals `name`.
    pub fn find(&self, name: &str) -> Option<Row> {
        self.entries
            .load()
            .iter()
            .find(|row| row.get(&self.display).and_then(Value::as_str) == Some(name))
            .cloned()
    }
}
