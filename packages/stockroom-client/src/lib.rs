//! REST collaborator client.
//!
//! Defines the [`Collaborator`] seam the cell editor talks to, the
//! request-scoped [`RequestContext`] carrying the bearer token and loading
//! reporter, and the `reqwest` based [`RestClient`].

pub mod collaborator;
pub mod context;
pub mod error;
pub mod rest;

pub use collaborator::Collaborator;
pub use context::{LoadingCounter, LoadingGuard, LoadingReporter, NoopLoading, RequestContext};
pub use error::{ClientError, Result};
pub use rest::RestClient;
