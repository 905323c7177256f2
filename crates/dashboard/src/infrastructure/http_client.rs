//! reqwest-backed `RequestGateway`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::ports::outbound::{GatewayError, HttpMethod, RequestGateway, TokenSource};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Authenticated JSON client for the dashboard API.
///
/// A fresh bearer token is requested from the token source for every call.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpGateway {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_timeout(base_url, tokens, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, tokens: Arc<dyn TokenSource>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, GatewayError> {
        let token = self.tokens.bearer_token().await?;
        let url = self.url_for(path);

        let builder = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        let builder = builder.bearer_auth(token);
        let builder = match body {
            Some(body) => builder.json(&body),
            None => builder,
        };

        tracing::debug!(%method, %url, "API request");
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%method, %url, status = status.as_u16(), "API request failed");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}
