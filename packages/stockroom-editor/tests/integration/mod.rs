//! Integration tests running the cell editor against the in-memory REST
//! backend over HTTP.
//!
//! 1. Optimistic edits
//! 2. Row lifecycle (refresh, create, delete)

pub mod edit_tests;
pub mod helpers;
pub mod lifecycle_tests;
