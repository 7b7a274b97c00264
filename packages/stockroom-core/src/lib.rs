//! Core data model for the stockroom dashboard.
//!
//! Provides resource schemas with typed field paths, the row collection
//! backing one table view, list query construction, and value comparison
//! used during reconciliation.

pub mod config;
pub mod error;
pub mod query;
pub mod rows;
pub mod schema;
pub mod value;

pub use error::{GridError, Result};
pub use query::{ListQuery, Page, SortKey};
pub use rows::{Row, RowCollection};
pub use schema::{FieldDef, FieldKind, FieldPath, FieldRef, ResourceSchema, SchemaRegistry};
pub use value::Pk;
