use crate::config::FetcherConfig;
use crate::error::{FetchError, Result};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

const TOO_MANY_REQUESTS: u16 = 429;

/// Status and body of one HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A source of HTTP GET responses
#[async_trait]
pub trait HttpSource: Send + Sync {
    /// Perform a single GET request. Non-success statuses are replies, not errors.
    async fn get(&self, url: &str) -> anyhow::Result<HttpReply>;
}

/// reqwest-backed source used in production
pub struct ReqwestSource {
    client: Client,
}

impl ReqwestSource {
    /// Create a new source with the configured request timeout
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn get(&self, url: &str) -> anyhow::Result<HttpReply> {
        let response = self.client.get(url).send().await.context("Failed to send request")?;
        let status = response.status().as_u16();
        let body = response.text().await.context("Failed to read response body")?;
        Ok(HttpReply { status, body })
    }
}

/// Endpoint name used in error messages: the path after the API version prefix,
/// without the query string.
pub fn endpoint_label(url: &str, version_prefix: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    match without_query.split_once(version_prefix) {
        Some((_, endpoint)) => endpoint.to_string(),
        None => without_query
            .split_once("://")
            .and_then(|(_, rest)| rest.split_once('/'))
            .map(|(_, path)| path.to_string())
            .unwrap_or_else(|| without_query.to_string()),
    }
}

/// GET `url` and parse the body as JSON.
///
/// Only HTTP 429 is retried, up to `retry.max_retries` extra attempts with
/// exponential backoff. Every other non-success status fails immediately.
pub async fn fetch_json<S>(source: &S, url: &str, config: &FetcherConfig) -> Result<Value>
where
    S: HttpSource + ?Sized,
{
    let endpoint = endpoint_label(url, &config.api_version_prefix);
    let max_attempts = config.retry.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!("GET {} (attempt {}/{})", url, attempt, max_attempts);

        let reply = source.get(url).await.map_err(|e| FetchError::Transport {
            endpoint: endpoint.clone(),
            message: format!("{e:#}"),
        })?;

        if reply.is_success() {
            return serde_json::from_str(&reply.body)
                .map_err(|source| FetchError::Decode { endpoint, source });
        }

        if reply.status != TOO_MANY_REQUESTS {
            return Err(FetchError::Status { endpoint, status: reply.status });
        }

        if attempt >= max_attempts {
            return Err(FetchError::RateLimited { endpoint, attempts: attempt });
        }

        let delay = config.retry.delay_for(attempt - 1);
        warn!("{} API rate limited, retrying in {:?} (attempt {}/{})", endpoint, delay, attempt, max_attempts);
        tokio::time::sleep(delay).await;
    }
}
