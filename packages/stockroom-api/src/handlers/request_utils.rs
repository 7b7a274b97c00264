//! Request utilities for HTTP endpoints.

use http_body_util::BodyExt;
use hyper::{body::Bytes, Request, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time;

use stockroom_core::{ListQuery, Pk};

use crate::router::RouterError;
use crate::store::StoreError;

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout(
    req: Request<hyper::body::Incoming>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Parses a request body that must be a JSON object.
pub fn parse_object_body(bytes: &[u8]) -> Result<Map<String, Value>, RouterError> {
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RouterError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(RouterError::BadRequest(format!("Failed to parse request: {}", e))),
    }
}

/// Reads the `resource` route parameter.
pub fn resource_param(params: &MatchitParams<'_, '_>) -> Result<String, RouterError> {
    params
        .get("resource")
        .map(str::to_string)
        .ok_or_else(|| RouterError::BadRequest("Missing resource".to_string()))
}

/// Reads and parses the `pk` route parameter.
pub fn pk_param(params: &MatchitParams<'_, '_>) -> Result<Pk, RouterError> {
    let raw = params.get("pk").unwrap_or_default();
    raw.parse()
        .map_err(|e| RouterError::BadRequest(format!("Invalid pk '{}': {}", raw, e)))
}

/// Parses list query parameters from the URL query string.
pub fn parse_query_params(query_str: Option<&str>) -> Result<ListQuery, RouterError> {
    match query_str {
        Some(raw) => {
            ListQuery::from_query_string(raw).map_err(|e| RouterError::BadRequest(e.to_string()))
        }
        None => Ok(ListQuery::new()),
    }
}

/// Map StoreError to appropriate RouterError
pub fn map_store_error_to_router_error(e: StoreError) -> RouterError {
    match e {
        StoreError::ResourceNotFound { .. } | StoreError::RecordNotFound { .. } => {
            RouterError::NotFound(e.to_string())
        }
        StoreError::UnknownField { .. }
        | StoreError::InvalidValue { .. }
        | StoreError::MissingRelated { .. }
        | StoreError::Schema(_) => RouterError::BadRequest(e.to_string()),
        StoreError::Seed(_) => RouterError::InternalError(e.to_string()),
    }
}

/// Serializes a value into a JSON response.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(data)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(status, json)
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Helper to build empty HTTP response (for 204 No Content)
pub fn build_empty_response(status: u16) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .body(Bytes::new())
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}
