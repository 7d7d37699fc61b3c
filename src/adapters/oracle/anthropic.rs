//! Anthropic Oracle - DecisionOracle implementation backed by the Anthropic
//! Messages API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_max_output_tokens(500);
//!
//! let oracle = AnthropicOracle::new(config);
//! ```
//!
//! One request per `decide` call, no retries: the pipeline handles every
//! failure with a deterministic fallback move instead of burning rounds.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{DecisionOracle, OracleError, OracleRequest};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic oracle. Read once at startup and
/// immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Upper bound on the oracle reply size.
    pub max_output_tokens: u32,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
            max_output_tokens: 500,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the reply size bound.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic Messages API oracle implementation.
pub struct AnthropicOracle {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicOracle {
    /// Creates a new oracle with the given configuration.
    pub fn new(config: AnthropicConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the messages endpoint URL.
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn to_api_request(&self, request: &OracleRequest) -> ApiRequest {
        ApiRequest {
            model: self.config.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.user_prompt.clone(),
            }],
            system: Some(request.system_prompt.clone()),
            max_tokens: self.config.max_output_tokens,
        }
    }

    async fn send_request(&self, request: &OracleRequest) -> Result<Response, OracleError> {
        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.to_api_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    OracleError::network(format!("Connection failed: {}", e))
                } else {
                    OracleError::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses onto typed errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, OracleError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(OracleError::AuthenticationFailed),
            429 => Err(OracleError::rate_limited(Self::parse_retry_after(
                &error_body,
            ))),
            400 => Err(OracleError::InvalidRequest(error_body)),
            500..=599 => Err(OracleError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(OracleError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        // Anthropic tends to put retry info in the error message text
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(msg) = parsed.get("error").and_then(|e| e.get("message")) {
                if let Some(s) = msg.as_str() {
                    if let Some(idx) = s.find("try again in ") {
                        let rest = &s[idx + 13..];
                        if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                            if let Ok(secs) = rest[..num_end].parse::<u32>() {
                                return secs;
                            }
                        }
                    }
                }
            }
        }
        60
    }

    /// Joins the text blocks of a successful response into the reply text.
    async fn parse_response(&self, response: Response) -> Result<String, OracleError> {
        let response = self.handle_response_status(response).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| OracleError::parse(format!("Failed to parse response: {}", e)))?;

        let text = api_response
            .content
            .into_iter()
            .filter_map(|block| {
                if block.block_type == "text" {
                    block.text
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        tracing::debug!(
            model = %api_response.model,
            input_tokens = api_response.usage.input_tokens,
            output_tokens = api_response.usage.output_tokens,
            "oracle reply received"
        );

        Ok(text)
    }
}

#[async_trait]
impl DecisionOracle for AnthropicOracle {
    async fn decide(&self, request: OracleRequest) -> Result<String, OracleError> {
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    content: Vec<ContentBlock>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = AnthropicConfig::new("test-key")
            .with_model("claude-3-haiku-20240307")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(30))
            .with_max_output_tokens(256);

        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_output_tokens, 256);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn api_request_carries_system_and_single_user_message() {
        let oracle = AnthropicOracle::new(AnthropicConfig::new("k").with_max_output_tokens(128));
        let request = OracleRequest::new("rules", "state");
        let api = oracle.to_api_request(&request);

        assert_eq!(api.system.as_deref(), Some("rules"));
        assert_eq!(api.messages.len(), 1);
        assert_eq!(api.messages[0].role, "user");
        assert_eq!(api.messages[0].content, "state");
        assert_eq!(api.max_tokens, 128);
    }

    #[test]
    fn parse_retry_after_extracts_seconds() {
        let error = r#"{"error":{"message":"Rate limited, try again in 12s"}}"#;
        assert_eq!(AnthropicOracle::parse_retry_after(error), 12);
    }

    #[test]
    fn parse_retry_after_default() {
        let error = r#"{"error":{"message":"Rate limit exceeded"}}"#;
        assert_eq!(AnthropicOracle::parse_retry_after(error), 60);
    }
}
