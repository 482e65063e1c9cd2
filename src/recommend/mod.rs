//! Recommendation request/response contract.
//!
//! One request is: trim and check the preference, build the prompt, call the
//! model gateway once, then parse and validate the reply. Nothing is cached
//! or retried; every call is independent and may overlap with others.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::prompt::{build_prompt, detect_language};
use crate::providers::{CompletionRequest, LlmProvider};

pub mod error;
pub mod parser;

pub use error::{ErrorKind, RecommendError};
pub use parser::{
    classify_entry, parse_recommendations, EntryOutcome, RejectReason, ValidatedRecommendation,
    MAX_RECOMMENDATIONS,
};

/// Outcome of one recommendation request.
///
/// `matched_ids` keeps the model's order and may repeat an id; `reasons`
/// holds one entry per distinct id, the last reason given winning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    /// Matched product ids, best first.
    pub matched_ids: Vec<u32>,
    /// Justification per matched id.
    pub reasons: BTreeMap<u32, String>,
}

impl RecommendationResult {
    /// Assemble a result from validated entries, preserving their order.
    pub fn from_validated(entries: Vec<ValidatedRecommendation>) -> Self {
        let mut result = Self {
            matched_ids: Vec::with_capacity(entries.len()),
            reasons: BTreeMap::new(),
        };
        for entry in entries {
            result.matched_ids.push(entry.product_id);
            result.reasons.insert(entry.product_id, entry.reason);
        }
        result
    }

    /// `true` when the model found no confident match.
    pub fn is_empty(&self) -> bool {
        self.matched_ids.is_empty()
    }

    /// Number of matched ids, repeats included.
    pub fn len(&self) -> usize {
        self.matched_ids.len()
    }

    /// Justification for a matched product.
    pub fn reason_for(&self, id: u32) -> Option<&str> {
        self.reasons.get(&id).map(String::as_str)
    }
}

/// Optional generation settings forwarded to the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationSettings {
    /// Output token cap.
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

/// Stateless orchestrator tying the prompt builder, gateway and parser.
#[derive(Clone)]
pub struct Recommender {
    provider: Arc<dyn LlmProvider>,
    catalog: Arc<Catalog>,
    settings: GenerationSettings,
}

impl Recommender {
    /// Create an orchestrator over a provider and a catalog.
    pub fn new(provider: Arc<dyn LlmProvider>, catalog: Arc<Catalog>) -> Self {
        Self {
            provider,
            catalog,
            settings: GenerationSettings::default(),
        }
    }

    /// Use these generation settings for every request.
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The catalog recommendations are drawn from.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run one recommendation request.
    ///
    /// # Errors
    ///
    /// Returns [`RecommendError::EmptyPreference`] without calling the
    /// gateway when `preference` is blank, [`RecommendError::Gateway`] when
    /// the gateway call fails, and the parser's errors otherwise.
    pub async fn recommend(&self, preference: &str) -> Result<RecommendationResult, RecommendError> {
        run(
            self.provider.as_ref(),
            preference,
            &self.catalog,
            self.settings,
        )
        .await
    }
}

/// Run one recommendation request with provider-default generation settings.
///
/// # Errors
///
/// Same as [`Recommender::recommend`].
pub async fn get_recommendations(
    provider: &dyn LlmProvider,
    preference: &str,
    catalog: &Catalog,
) -> Result<RecommendationResult, RecommendError> {
    run(provider, preference, catalog, GenerationSettings::default()).await
}

async fn run(
    provider: &dyn LlmProvider,
    preference: &str,
    catalog: &Catalog,
    settings: GenerationSettings,
) -> Result<RecommendationResult, RecommendError> {
    let preference = preference.trim();
    if preference.is_empty() {
        return Err(RecommendError::EmptyPreference);
    }

    let language = detect_language(preference);
    let span = info_span!(
        "recommend",
        request_id = %Uuid::new_v4(),
        model = provider.model_id(),
        %language,
        catalog_size = catalog.len(),
    );

    async move {
        let request = CompletionRequest {
            prompt: build_prompt(preference, catalog),
            max_output_tokens: settings.max_output_tokens,
            temperature: settings.temperature,
        };
        info!(prompt_chars = request.prompt.chars().count(), "requesting recommendations");

        let response = provider.complete(request).await.map_err(|e| {
            warn!(error = %e, "model gateway failed");
            RecommendError::Gateway(e)
        })?;

        let result = parse_recommendations(&response.text, catalog).map_err(|e| {
            warn!(error = %e, "model reply rejected");
            e
        })?;

        info!(matched = result.len(), "recommendations ready");
        Ok(result)
    }
    .instrument(span)
    .await
}
