//! The remote store the dashboard reads from and writes to.

use async_trait::async_trait;
use serde_json::{Map, Value};

use stockroom_core::{ListQuery, Page, Pk};

use crate::context::RequestContext;
use crate::error::Result;

/// Remote collaborator holding the authoritative records.
///
/// Implementations return `Err` for transport failures and non-2xx
/// statuses; interpreting a successful body is left to the caller.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// `GET /<resource>/?<query>` returning `{count, results}`.
    async fn list(&self, ctx: &RequestContext, resource: &str, query: &ListQuery)
        -> Result<Page>;

    /// `POST /<resource>/` with a full record; returns the created object.
    async fn create(
        &self,
        ctx: &RequestContext,
        resource: &str,
        body: &Map<String, Value>,
    ) -> Result<Value>;

    /// `PATCH /<resource>/<pk>/` with the changed fields; returns the echo.
    async fn patch(
        &self,
        ctx: &RequestContext,
        resource: &str,
        pk: Pk,
        body: &Map<String, Value>,
    ) -> Result<Value>;

    /// `DELETE /<resource>/<pk>/`; returns the HTTP status.
    async fn delete(&self, ctx: &RequestContext, resource: &str, pk: Pk) -> Result<u16>;
}
