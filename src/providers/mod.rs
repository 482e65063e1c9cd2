//! Model gateway abstraction.
//!
//! The recommendation pipeline only needs "prompt in, text out". The
//! [`LlmProvider`] trait captures that boundary so the orchestrator can be
//! driven by the real [`gemini::GeminiProvider`] or by a test double.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod gemini;

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Maximum tokens in the response.
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Request with provider defaults for every generation setting.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens: None,
            temperature: None,
        }
    }
}

/// Usage statistics for a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageStats {
    /// Tokens used in the prompt/input.
    pub input_tokens: u32,
    /// Tokens generated in the response.
    pub output_tokens: u32,
}

/// The raw reply from a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Free-form reply text, unparsed.
    pub text: String,
    /// Provider-reported stop reason, if any.
    pub finish_reason: Option<String>,
    /// Token usage, when the provider reports it.
    pub usage: Option<UsageStats>,
    /// The model identifier that served this response.
    pub model: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by model providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match the expected reply shape.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream provider responded with an error status.
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Provider cannot satisfy the request with current configuration.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure, `ProviderError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

const MAX_ERROR_BODY_CHARS: usize = 256;

fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"AIza[0-9A-Za-z_\-]{20,}",
        r"ya29\.[0-9A-Za-z_\-]{20,}",
        r"(?i)bearer\s+[0-9A-Za-z_\-\.]{16,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Model gateway interface.
///
/// Implementations must be `Send + Sync` so one provider can serve
/// overlapping requests from many tasks.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the raw reply.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on network failure, non-success status, or
    /// a reply that does not have the provider's expected shape.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;

    /// The model identifier this provider is instantiated for.
    fn model_id(&self) -> &str;
}
