//! Decision Oracle Port - Interface to the external reasoning service.
//!
//! The oracle is an opaque capability `decide(request) -> text, may fail`.
//! Implementations connect to a concrete LLM backend; the pipeline's
//! fallback contract holds regardless of which backend sits behind this
//! trait.

use async_trait::async_trait;

/// Port for the external reasoning service that produces candidate
/// negotiation decisions.
///
/// A single attempt per pipeline run; no retries. Negotiation rounds are
/// discount-sensitive, so one deterministic fallback move beats spending
/// rounds on a flaky oracle.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Asks the oracle for a decision. The reply is raw text expected to
    /// contain one JSON object; parsing is the caller's concern.
    async fn decide(&self, request: OracleRequest) -> Result<String, OracleError>;
}

/// A single oracle invocation: fixed system instruction plus a per-call
/// user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// System-level instruction (reply shapes, JSON-only rule).
    pub system_prompt: String,
    /// Rendered game state and action request.
    pub user_prompt: String,
}

impl OracleRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
        }
    }
}

/// Oracle invocation errors.
///
/// Downstream logic treats every variant identically (fallback decision);
/// the distinctions exist for logging and diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Rate limited by the service.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Service is unavailable.
    #[error("oracle unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse the service's wire response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The service rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl OracleError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_constructor_stores_prompts() {
        let request = OracleRequest::new("system", "user");
        assert_eq!(request.system_prompt, "system");
        assert_eq!(request.user_prompt, "user");
    }

    #[test]
    fn errors_display_their_cause() {
        assert_eq!(
            OracleError::rate_limited(30).to_string(),
            "rate limited: retry after 30s"
        );
        assert_eq!(
            OracleError::unavailable("down for maintenance").to_string(),
            "oracle unavailable: down for maintenance"
        );
        assert_eq!(
            OracleError::network("connection refused").to_string(),
            "network error: connection refused"
        );
        assert_eq!(
            OracleError::Timeout { timeout_secs: 60 }.to_string(),
            "request timed out after 60s"
        );
    }
}
