//! Collection and record handlers.

use hyper::{body::Bytes, Request, Response};

use crate::router::{AppState, RouterError};

use super::request_utils::{
    build_empty_response, json_response, map_store_error_to_router_error, parse_object_body,
    parse_query_params, pk_param, read_request_body_with_timeout, resource_param, MatchitParams,
};

/// Lists records of a resource.
///
/// # Endpoint
/// `GET /{resource}/`
///
/// # Query Parameters
/// - `limit`, `offset`: Page window
/// - `search`: Case-insensitive substring over text fields
/// - `ordering`: Comma-separated fields, `-` prefix for descending
/// - `{field}` or `{relation}.{field}`: Equality filter
///
/// # Response
/// - **200 OK**
/// ```json
/// {
///   "count": 42,
///   "results": [{"pk": 1, "serial": "A-1", "room": {"pk": 3, "name": "Shelf A"}}]
/// }
/// ```
///
/// # Errors
/// - **400 Bad Request**: Invalid `limit` or `offset`
/// - **404 Not Found**: Unknown resource
///
/// # Example
/// ```bash
/// curl 'http://localhost:8080/inventory/?limit=25&ordering=-received&search=chair'
/// ```
pub async fn list_records(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let resource = resource_param(&params)?;
    let query = parse_query_params(req.uri().query())?;

    let page = state
        .store
        .list(&resource, &query)
        .map_err(map_store_error_to_router_error)?;

    json_response(200, &page)
}

/// Creates a record.
///
/// # Endpoint
/// `POST /{resource}/`
///
/// # Request Body
/// ```json
/// {"serial": "C-1", "room": 3}
/// ```
///
/// # Response
/// - **201 Created**: The stored record with its assigned `pk`
///
/// # Errors
/// - **400 Bad Request**: Unknown field, invalid value or missing related record
/// - **404 Not Found**: Unknown resource
pub async fn create_record(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let resource = resource_param(&params)?;
    let body_bytes = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let body = parse_object_body(&body_bytes)?;

    let record = state
        .store
        .create(&resource, body)
        .map_err(map_store_error_to_router_error)?;
    tracing::info!(%resource, pk = ?record.get("pk"), "record created");

    json_response(201, &record)
}

/// Reads one record.
///
/// # Endpoint
/// `GET /{resource}/{pk}/`
///
/// # Errors
/// - **400 Bad Request**: Invalid `pk`
/// - **404 Not Found**: Unknown resource or record
pub async fn read_record(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let resource = resource_param(&params)?;
    let pk = pk_param(&params)?;

    let record = state
        .store
        .read(&resource, pk)
        .map_err(map_store_error_to_router_error)?;

    json_response(200, &record)
}

/// Partially updates a record.
///
/// # Endpoint
/// `PATCH /{resource}/{pk}/`
///
/// # Request Body
/// ```json
/// {"room": 7}
/// ```
///
/// # Response
/// - **200 OK**: The stored record after the update
///
/// # Notes
/// - Read-only fields in the body are ignored; the response reports their
///   stored value
pub async fn partial_update_record(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let resource = resource_param(&params)?;
    let pk = pk_param(&params)?;
    let body_bytes = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let body = parse_object_body(&body_bytes)?;

    let record = state
        .store
        .update(&resource, pk, body)
        .map_err(map_store_error_to_router_error)?;

    json_response(200, &record)
}

/// Deletes a record.
///
/// # Endpoint
/// `DELETE /{resource}/{pk}/`
///
/// # Response
/// - **204 No Content**
///
/// # Errors
/// - **404 Not Found**: Unknown resource or record
pub async fn delete_record(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let resource = resource_param(&params)?;
    let pk = pk_param(&params)?;

    state
        .store
        .delete(&resource, pk)
        .map_err(map_store_error_to_router_error)?;
    tracing::info!(%resource, pk, "record deleted");

    build_empty_response(204)
}
