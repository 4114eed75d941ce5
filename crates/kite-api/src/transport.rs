//! HTTP transport
//!
//! `Transport` is the narrow seam between endpoint logic and the wire:
//! every endpoint is either a GET with query parameters or a form POST,
//! and every answer is JSON. An empty body decodes to `Value::Null`.

use crate::config::ClientConfig;
use crate::error::ApiResult;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;

/// JSON-over-HTTP request executor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` with query parameters
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value>;

    /// POST `form` to `path` as `application/x-www-form-urlencoded`
    async fn post_form(&self, path: &str, form: &[(String, String)]) -> ApiResult<Value>;
}

/// `Transport` backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    /// Build a client honouring the configured timeout
    ///
    /// # Errors
    /// Returns `ApiError::Http` if the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Base URL requests are sent to
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn read_json(response: reqwest::Response) -> ApiResult<Value> {
        let body = response.error_for_status()?.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        let url = self.config.endpoint(path);
        tracing::debug!(%url, params = query.len(), "GET");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn post_form(&self, path: &str, form: &[(String, String)]) -> ApiResult<Value> {
        let url = self.config.endpoint(path);
        tracing::debug!(%url, fields = form.len(), "POST");
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;
        Self::read_json(response).await
    }
}
