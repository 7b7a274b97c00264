//! Client and backend configuration.

/// Configuration of the dashboard's REST client and cell editor.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API (no trailing slash needed)
    pub base_url: String,
    /// Transport timeout for a single HTTP request in milliseconds
    pub request_timeout_ms: u64,
    /// Time an optimistic edit waits for its response before rolling back
    pub response_timeout_ms: u64,
    /// Rows requested per page
    pub page_size: usize,
    /// Create missing related records when a relation cell names one
    pub create_missing_references: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_ms: 5000,   // 5 seconds default
            response_timeout_ms: 10000, // 10 seconds default
            page_size: 25,
            create_missing_references: false,
        }
    }
}

/// Configuration of the in-memory REST backend.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on (0 picks a free port)
    pub port: u16,
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Bearer token required on every request, if set
    pub auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_ms: 5000,
            auth_token: None,
        }
    }
}
