//! HTTP client for OpenAI-compatible chat endpoints.
//!
//! The request timeout is the pipeline's sole cancellation point: a timed
//! out call surfaces as a `BridgeError::Timeout` value and the compiler
//! front-end falls through to the rule-based extractor.

use crate::types::{ApiError, ChatRequest, ChatResponse};
use reqwest::Client;
use std::time::Duration;
use terrasmith_core::BridgeError;
use tracing::debug;

const PROVIDER: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Point at a non-default endpoint (self-hosted OpenAI-compatible APIs,
    /// or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// POST a chat-completion request. Error messages carry the provider
    /// status and its structured error message, never the credential and
    /// never a raw response body.
    pub async fn complete(&self, body: &ChatRequest) -> Result<ChatResponse, BridgeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(|e| BridgeError::UnparseableReply {
                provider: PROVIDER.to_string(),
                reason: format!("failed to decode response body: {}", e),
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            // Only the structured error message is surfaced; anything else
            // may carry provider internals and stays at debug level.
            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(api) => api.error.message,
                Err(_) => {
                    debug!(status = status.as_u16(), body = %body, "unstructured provider error body");
                    format!("unrecognized error body, {} bytes", body.len())
                }
            };
            Err(BridgeError::RequestFailed {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            })
        }
    }

    fn classify_transport(&self, err: reqwest::Error) -> BridgeError {
        if err.is_timeout() {
            BridgeError::Timeout {
                provider: PROVIDER.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            BridgeError::RequestFailed {
                provider: PROVIDER.to_string(),
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                // reqwest error display never includes request headers
                message: err.to_string(),
            }
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
