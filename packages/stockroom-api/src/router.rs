//! Matchit routing configuration.

use std::sync::Arc;

use hyper::header::AUTHORIZATION;
use hyper::{body::Bytes, Method, Request, Response};
use matchit::Router as MatchitRouter;

use stockroom_core::config::ServerConfig;

use crate::handlers;
use crate::store::Store;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Record store
    pub store: Arc<Store>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a router serving the collection and record routes.
    ///
    /// Paths are accepted with and without the trailing slash.
    pub fn new(store: Arc<Store>, config: Arc<ServerConfig>) -> Self {
        let mut router = MatchitRouter::new();

        for (path, handler) in [
            ("/{resource}", RouteHandler::Collection),
            ("/{resource}/", RouteHandler::Collection),
            ("/{resource}/{pk}", RouteHandler::Record),
            ("/{resource}/{pk}/", RouteHandler::Record),
        ] {
            router
                .insert(path, handler)
                .unwrap_or_else(|e| panic!("Failed to insert {} route: {}", path, e));
        }

        Self {
            inner: router,
            state: AppState { store, config },
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// # Arguments
    /// * `req` - HTTP request
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<Bytes>, RouterError> {
        self.authorize(&req)?;

        let path = req.uri().path().to_string();
        match self.inner.at(&path) {
            Ok(matched) => {
                matched
                    .value
                    .handle(req, matched.params, self.state.clone())
                    .await
            }
            Err(_) => Err(RouterError::NotFound(format!("No route found for {}", path))),
        }
    }

    /// Checks the bearer token when one is configured.
    fn authorize(&self, req: &Request<hyper::body::Incoming>) -> Result<(), RouterError> {
        let Some(expected) = self.state.config.auth_token.as_deref() else {
            return Ok(());
        };
        let presented = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        if presented == Some(expected) {
            Ok(())
        } else {
            Err(RouterError::Unauthorized)
        }
    }
}

/// Route handler function.
#[derive(Clone, Copy)]
enum RouteHandler {
    Collection,
    Record,
}

impl RouteHandler {
    /// Handles a request with the given route parameters.
    async fn handle(
        &self,
        req: Request<hyper::body::Incoming>,
        params: matchit::Params<'_, '_>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError> {
        match (self, req.method().clone()) {
            (RouteHandler::Collection, Method::GET) => {
                handlers::list_records(req, params, state).await
            }
            (RouteHandler::Collection, Method::POST) => {
                handlers::create_record(req, params, state).await
            }
            (RouteHandler::Record, Method::GET) => handlers::read_record(req, params, state).await,
            (RouteHandler::Record, Method::PATCH) => {
                handlers::partial_update_record(req, params, state).await
            }
            (RouteHandler::Record, Method::DELETE) => {
                handlers::delete_record(req, params, state).await
            }
            _ => Err(RouterError::MethodNotAllowed),
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    Unauthorized,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
}

impl RouterError {
    pub fn status(&self) -> u16 {
        match self {
            RouterError::MethodNotAllowed => 405,
            RouterError::Unauthorized => 401,
            RouterError::InternalError(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest(_) => 400,
            RouterError::NotFound(_) => 404,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::Unauthorized => write!(f, "Authentication credentials were not provided or are invalid"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let error_response = crate::handlers::error_response(status, err.to_string(), None);
        let body = serde_json::to_vec(&error_response).unwrap_or_else(|e| {
            format!(
                "{{\"success\":false,\"error\":{{\"code\":\"500\",\"message\":\"Failed to serialize error: {}\"}}}}",
                e
            )
            .into_bytes()
        });

        let mut builder = Response::builder()
            .status(status)
            .header("Content-Type", "application/json");
        if status == 401 {
            builder = builder.header("WWW-Authenticate", "Bearer");
        }
        builder.body(Bytes::from(body)).unwrap_or_else(|_| {
            let mut fallback = Response::new(Bytes::from("Internal Server Error"));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}
