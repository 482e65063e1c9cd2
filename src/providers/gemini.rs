//! Google Gemini provider using the `generateContent` API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::credentials::ApiKey;

use super::{
    check_http_response, CompletionRequest, CompletionResponse, LlmProvider, ProviderError,
    UsageStats,
};

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when the configuration does not name one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `generateContent` request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation turns; always a single user turn here.
    pub contents: Vec<GeminiRequestContent>,
    /// Generation settings, omitted when all defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

/// One content turn in a request.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GeminiRequestContent {
    /// Text parts of the turn.
    pub parts: Vec<GeminiRequestPart>,
}

/// A text part in a request.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GeminiRequestPart {
    /// Part text.
    pub text: String,
}

/// Generation settings.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Output token cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// `generateContent` response body. Every field is optional so that shape
/// problems surface as explicit errors instead of serde failures.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Candidate replies.
    pub candidates: Option<Vec<GeminiCandidate>>,
    /// Token accounting.
    pub usage_metadata: Option<GeminiUsage>,
    /// Model version that served the call.
    pub model_version: Option<String>,
    /// Present when the prompt itself was blocked.
    pub prompt_feedback: Option<GeminiPromptFeedback>,
}

/// One candidate reply.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Reply content.
    pub content: Option<GeminiResponseContent>,
    /// Why generation stopped.
    pub finish_reason: Option<String>,
}

/// Content of a candidate reply.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiResponseContent {
    /// Reply parts.
    pub parts: Option<Vec<GeminiResponsePart>>,
    /// Author role, normally `"model"`.
    pub role: Option<String>,
}

/// A reply part.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GeminiResponsePart {
    /// Part text.
    pub text: Option<String>,
}

/// Token usage metadata.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiUsage {
    /// Prompt tokens.
    pub prompt_token_count: Option<u32>,
    /// Generated tokens.
    pub candidates_token_count: Option<u32>,
}

/// Prompt-level safety feedback.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPromptFeedback {
    /// Reason the prompt was blocked, if it was.
    pub block_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Gemini `generateContent` provider.
#[derive(Clone)]
pub struct GeminiProvider {
    model: String,
    api_key: ApiKey,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiProvider {
    /// Create a provider against the public Gemini endpoint.
    pub fn new(model: String, api_key: ApiKey) -> Self {
        Self {
            model,
            api_key,
            base_url: DEFAULT_GEMINI_URL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the provider at a different API base URL.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Unavailable` if the URL cannot be combined
    /// into a valid endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ProviderError> {
        endpoint_url(base_url, &self.model)?;
        self.base_url = base_url.to_owned();
        Ok(self)
    }

    /// Apply a whole-request timeout to the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Request` if the client cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProviderError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Combine a base URL and model into the `generateContent` endpoint.
///
/// # Errors
///
/// Returns `ProviderError::Unavailable` on an unparseable base URL or an
/// empty model name.
#[doc(hidden)]
pub fn endpoint_url(base_url: &str, model: &str) -> Result<Url, ProviderError> {
    if model.trim().is_empty() {
        return Err(ProviderError::Unavailable(
            "gemini model name is empty".to_owned(),
        ));
    }
    let mut base = base_url.to_owned();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)
        .and_then(|url| url.join(&format!("v1beta/models/{model}:generateContent")))
        .map_err(|e| ProviderError::Unavailable(format!("invalid gemini base url {base_url:?}: {e}")))
}

/// Build a Gemini request body from a completion request.
#[doc(hidden)]
pub fn build_request(request: &CompletionRequest) -> GeminiRequest {
    let generation_config =
        if request.max_output_tokens.is_none() && request.temperature.is_none() {
            None
        } else {
            Some(GeminiGenerationConfig {
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            })
        };

    GeminiRequest {
        contents: vec![GeminiRequestContent {
            parts: vec![GeminiRequestPart {
                text: request.prompt.clone(),
            }],
        }],
        generation_config,
    }
}

/// Parse a Gemini response body, taking the text of the first part of the
/// first candidate.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body is not JSON or any level of
/// `candidates[0].content.parts[0].text` is missing.
#[doc(hidden)]
pub fn parse_response(model: &str, body: &str) -> Result<CompletionResponse, ProviderError> {
    let resp: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let mut candidates = resp.candidates.unwrap_or_default();
    if candidates.is_empty() {
        let blocked = resp
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        return Err(ProviderError::Parse(match blocked {
            Some(reason) => format!("prompt blocked by provider: {reason}"),
            None => "response has no candidates".to_owned(),
        }));
    }
    let candidate = candidates.swap_remove(0);

    let text = candidate
        .content
        .ok_or_else(|| ProviderError::Parse("candidate has no content".to_owned()))?
        .parts
        .and_then(|parts| parts.into_iter().next())
        .ok_or_else(|| ProviderError::Parse("candidate content has no parts".to_owned()))?
        .text
        .ok_or_else(|| ProviderError::Parse("first content part has no text".to_owned()))?;

    let usage = resp.usage_metadata.map(|u| UsageStats {
        input_tokens: u.prompt_token_count.unwrap_or(0),
        output_tokens: u.candidates_token_count.unwrap_or(0),
    });

    Ok(CompletionResponse {
        text,
        finish_reason: candidate.finish_reason,
        usage,
        model: resp.model_version.unwrap_or_else(|| model.to_owned()),
    })
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = endpoint_url(&self.base_url, &self.model)?;
        let api_request = build_request(&request);

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        let parsed = parse_response(&self.model, &payload)?;
        debug!(
            model = %parsed.model,
            finish_reason = parsed.finish_reason.as_deref().unwrap_or("unknown"),
            input_tokens = parsed.usage.map(|u| u.input_tokens),
            output_tokens = parsed.usage.map(|u| u.output_tokens),
            "gemini completion received"
        );
        Ok(parsed)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
