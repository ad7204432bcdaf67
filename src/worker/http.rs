//! HTTP transport for the content-extraction API

use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// Worth another attempt: timeouts, connection trouble, 429 and 5xx.
    /// Client errors are terminal, the request would just fail again.
    fn is_transient(&self) -> bool {
        match self {
            TransportError::Timeout => true,
            TransportError::RequestFailed(_) => true,
            TransportError::Status { code, .. } => *code == 429 || *code >= 500,
            TransportError::MalformedResponse(_) => false,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            user_agent: "pagevault/0.1.0".to_string(),
        }
    }
}

/// Client for the extraction API
///
/// `fetch` either returns a parsed response envelope or fails once, after
/// internal retries are exhausted; callers see no retry machinery.
pub struct ExtractClient {
    client: Client,
    config: HttpConfig,
    endpoint: String,
    api_key: String,
}

impl ExtractClient {
    /// Create a new API client
    pub fn new(
        config: HttpConfig,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Fetch a target through the extraction API, with retry
    pub async fn fetch(&self, url: &str) -> Result<Value> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.fetch_once(url).await {
                Ok(envelope) => {
                    if attempts > 1 {
                        debug!(url, attempts, "Fetch succeeded after retry");
                    }
                    return Ok(envelope);
                }
                Err(e) if !e.is_transient() => {
                    warn!(url, attempts, error = %e, "Fetch failed, not retrying");
                    return Err(e);
                }
                Err(e) => {
                    if attempts >= self.config.max_retries {
                        warn!(url, attempts, error = %e, "Fetch failed after retries");
                        return Err(e);
                    }

                    warn!(url, attempts, error = %e, "Fetch failed, retrying");

                    // Exponential backoff: 1s, 2s, 4s
                    let backoff = Duration::from_secs(2u64.pow(attempts - 1));
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Fetch once (no retry)
    async fn fetch_once(&self, url: &str) -> Result<Value> {
        debug!(url, "Requesting extraction");

        let payload = json!({
            "url": url,
            "httpResponseBody": true,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.api_key, Some(""))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let envelope = response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        debug!(url, "Extraction response received");

        Ok(envelope)
    }
}
