//! Reduce raw model text to validated recommendations.
//!
//! The envelope is strict: no JSON object, bad JSON, or a missing
//! `recommendations` array fails the whole reply. Individual entries are
//! lenient: each is classified on its own and bad ones are dropped.

use std::fmt;

use serde_json::{Number, Value};
use tracing::debug;

use crate::catalog::Catalog;

use super::{RecommendError, RecommendationResult};

/// Upper bound on recommendations kept from one reply.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// An entry that passed identifier and reason checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecommendation {
    /// Identifier of an existing catalog product.
    pub product_id: u32,
    /// Non-empty justification text.
    pub reason: String,
}

/// Why an entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The element is not a JSON object.
    NotAnObject,
    /// `productId` is absent or null.
    MissingProductId,
    /// `productId` is present but not a number.
    NonNumericProductId,
    /// `productId` is a number that no catalog product has.
    UnknownProduct(String),
    /// `reason` is absent or null.
    MissingReason,
    /// `reason` is present but not a string.
    NonStringReason,
    /// `reason` is the empty string.
    EmptyReason,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("entry is not an object"),
            Self::MissingProductId => f.write_str("productId missing"),
            Self::NonNumericProductId => f.write_str("productId is not a number"),
            Self::UnknownProduct(id) => write!(f, "productId {id} is not in the catalog"),
            Self::MissingReason => f.write_str("reason missing"),
            Self::NonStringReason => f.write_str("reason is not a string"),
            Self::EmptyReason => f.write_str("reason is empty"),
        }
    }
}

/// Per-entry classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Entry survives into the result.
    Valid(ValidatedRecommendation),
    /// Entry is dropped.
    Rejected(RejectReason),
}

/// Parse raw model text into a [`RecommendationResult`].
///
/// Blank text yields an empty result. Code fences are removed and, when the
/// text does not start with `{`, the first JSON object embedded in the
/// surrounding prose is used.
///
/// # Errors
///
/// Returns [`RecommendError::Parse`] when no JSON object can be found or it
/// does not parse, and [`RecommendError::Validation`] when the object has no
/// `recommendations` array.
pub fn parse_recommendations(
    raw: &str,
    catalog: &Catalog,
) -> Result<RecommendationResult, RecommendError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(RecommendationResult::default());
    }

    let candidate = extract_json_candidate(trimmed)?;
    let envelope: Value =
        serde_json::from_str(&candidate).map_err(|_| RecommendError::malformed_json())?;

    let entries = envelope
        .get("recommendations")
        .and_then(Value::as_array)
        .ok_or_else(RecommendError::bad_envelope)?;

    let validated: Vec<ValidatedRecommendation> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match classify_entry(entry, catalog) {
            EntryOutcome::Valid(rec) => Some(rec),
            EntryOutcome::Rejected(reason) => {
                debug!(index, %reason, "dropping recommendation entry");
                None
            }
        })
        .take(MAX_RECOMMENDATIONS)
        .collect();

    Ok(RecommendationResult::from_validated(validated))
}

/// Decide whether one `recommendations` element is usable.
pub fn classify_entry(entry: &Value, catalog: &Catalog) -> EntryOutcome {
    let Some(fields) = entry.as_object() else {
        return EntryOutcome::Rejected(RejectReason::NotAnObject);
    };

    let product_id = match fields.get("productId") {
        None | Some(Value::Null) => return EntryOutcome::Rejected(RejectReason::MissingProductId),
        Some(Value::Number(number)) => match resolve_product_id(number, catalog) {
            Some(id) => id,
            None => {
                return EntryOutcome::Rejected(RejectReason::UnknownProduct(number.to_string()))
            }
        },
        Some(_) => return EntryOutcome::Rejected(RejectReason::NonNumericProductId),
    };

    let reason = match fields.get("reason") {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::String(_)) => return EntryOutcome::Rejected(RejectReason::EmptyReason),
        None | Some(Value::Null) => return EntryOutcome::Rejected(RejectReason::MissingReason),
        Some(_) => return EntryOutcome::Rejected(RejectReason::NonStringReason),
    };

    EntryOutcome::Valid(ValidatedRecommendation { product_id, reason })
}

/// Match a JSON number against catalog ids. `4` and `4.0` both match id 4.
///
/// Numbers outside `f64` range (e.g. `1e400`) survive parsing and match
/// nothing.
fn resolve_product_id(number: &Number, catalog: &Catalog) -> Option<u32> {
    if let Some(raw) = number.as_u64() {
        return u32::try_from(raw).ok().filter(|id| catalog.contains(*id));
    }
    let value = number.as_f64()?;
    catalog
        .products()
        .iter()
        .map(|p| p.id)
        .find(|id| f64::from(*id) == value)
}

/// Strip code fences and locate the JSON object text.
fn extract_json_candidate(text: &str) -> Result<String, RecommendError> {
    let cleaned = strip_code_fences(text);
    let cleaned = cleaned.trim();

    if cleaned.starts_with('{') {
        return Ok(cleaned.to_owned());
    }

    find_object_span(cleaned)
        .map(str::to_owned)
        .ok_or_else(RecommendError::no_json_object)
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "")
}

/// Find the object starting at the first `{`.
///
/// Tracks brace depth outside string literals and stops at the matching
/// close. If the braces never balance, falls back to the span ending at the
/// last `}`.
fn find_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let tail = text.get(start..)?;

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in tail.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth = depth.saturating_add(1),
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return tail.get(..=offset);
                }
            }
            _ => {}
        }
    }

    let end = tail.rfind('}')?;
    tail.get(..=end)
}
