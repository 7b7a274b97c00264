//! In-memory REST backend for the stockroom resources.
//!
//! Serves the collection contract the dashboard consumes
//! (`/<resource>/` and `/<resource>/<pk>/`) over a [`store::Store`] built
//! from the resource schemas. Used by the `stock-server` binary and by
//! integration tests.

pub mod handlers;
pub mod router;
pub mod server;
pub mod store;

pub use router::{AppState, Router, RouterError};
pub use server::Server;
pub use store::{Store, StoreError};
