//! Single user-facing error type for the recommendation contract.

use crate::providers::ProviderError;

/// Why a recommendation request produced no result.
///
/// None of these are retried. An empty result is not an error and is never
/// reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    /// The preference text was empty or whitespace only.
    #[error("preference text is empty")]
    EmptyPreference,
    /// The model gateway failed or replied with an unexpected shape.
    #[error("model gateway failed: {0}")]
    Gateway(#[from] ProviderError),
    /// The reply text could not be reduced to a JSON object.
    #[error("could not parse model reply: {0}")]
    Parse(String),
    /// The reply was JSON but the envelope had the wrong shape.
    #[error("invalid model reply: {0}")]
    Validation(String),
}

/// Coarse classification of a [`RecommendError`], for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied unusable input.
    Input,
    /// Transport or provider failure.
    Gateway,
    /// Reply was not JSON.
    Parse,
    /// Reply JSON had the wrong envelope.
    Validation,
}

impl RecommendError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPreference => ErrorKind::Input,
            Self::Gateway(_) => ErrorKind::Gateway,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    pub(crate) fn no_json_object() -> Self {
        Self::Parse("no JSON object found".to_owned())
    }

    pub(crate) fn malformed_json() -> Self {
        Self::Parse("malformed JSON".to_owned())
    }

    pub(crate) fn bad_envelope() -> Self {
        Self::Validation("missing or malformed recommendations field".to_owned())
    }
}
