//! `reqwest` implementation of the collaborator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{Map, Value};

use stockroom_core::config::ClientConfig;
use stockroom_core::{ListQuery, Page, Pk};

use crate::collaborator::Collaborator;
use crate::context::RequestContext;
use crate::error::{ClientError, Result};

/// HTTP client for the dashboard's REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Creates a client from configuration.
    ///
    /// # Returns
    /// `Err(ClientError::NetworkError)` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/<resource>/`
    pub fn collection_url(&self, resource: &str) -> String {
        format!("{}/{}/", self.base_url, resource)
    }

    /// `<base>/<resource>/<pk>/`
    pub fn record_url(&self, resource: &str, pk: Pk) -> String {
        format!("{}/{}/{}/", self.base_url, resource, pk)
    }

    fn authorize(&self, builder: RequestBuilder, ctx: &RequestContext) -> RequestBuilder {
        match ctx.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and decodes a JSON body from a 2xx response.
    async fn send_json(&self, builder: RequestBuilder, ctx: &RequestContext) -> Result<Value> {
        let response = self.authorize(builder, ctx).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn status_error(status: StatusCode, body: String) -> ClientError {
    if status == StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized(body)
    } else {
        ClientError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl Collaborator for RestClient {
    async fn list(
        &self,
        ctx: &RequestContext,
        resource: &str,
        query: &ListQuery,
    ) -> Result<Page> {
        let _loading = ctx.track("list");
        let query_string = query.to_query_string();
        let url = if query_string.is_empty() {
            self.collection_url(resource)
        } else {
            format!("{}?{}", self.collection_url(resource), query_string)
        };
        tracing::debug!(%url, "GET");

        let body = self.send_json(self.http.get(&url), ctx).await?;
        serde_json::from_value(body)
            .map_err(|e| ClientError::ProtocolError(format!("Invalid list envelope: {}", e)))
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        resource: &str,
        body: &Map<String, Value>,
    ) -> Result<Value> {
        let _loading = ctx.track("create");
        let url = self.collection_url(resource);
        tracing::debug!(%url, "POST");
        self.send_json(self.http.post(&url).json(body), ctx).await
    }

    async fn patch(
        &self,
        ctx: &RequestContext,
        resource: &str,
        pk: Pk,
        body: &Map<String, Value>,
    ) -> Result<Value> {
        let _loading = ctx.track("patch");
        let url = self.record_url(resource, pk);
        tracing::debug!(%url, fields = body.len(), "PATCH");
        self.send_json(self.http.patch(&url).json(body), ctx).await
    }

    async fn delete(&self, ctx: &RequestContext, resource: &str, pk: Pk) -> Result<u16> {
        let _loading = ctx.track("delete");
        let url = self.record_url(resource, pk);
        tracing::debug!(%url, "DELETE");

        let response = self.authorize(self.http.delete(&url), ctx).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }
        Ok(status.as_u16())
    }
}
