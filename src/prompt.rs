//! Prompt construction for the recommendation call.
//!
//! The whole catalog is embedded as JSON next to the user's preference,
//! followed by strict output-format instructions. The reply language is
//! chosen from the script of the preference text and is a request to the
//! model, not something the parser checks.

use std::fmt;

use crate::catalog::Catalog;

/// Response language requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Default when no Devanagari is present.
    English,
    /// Selected when the preference contains any Devanagari code point.
    Hindi,
}

impl Language {
    /// English name of the language, as written into the prompt.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the reply language from the script of `text`.
///
/// Any character in the Devanagari block (U+0900..=U+097F) selects Hindi.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        Language::Hindi
    } else {
        Language::English
    }
}

const ENGLISH_EXAMPLE: &str = r#"{
  "recommendations": [
    {
      "productId": 4,
      "reason": "16GB RAM and a Snapdragon 8 Gen 3 at a mid-range price. The 5400 mAh battery lasts a full day of heavy use."
    },
    {
      "productId": 7,
      "reason": "Solid camera and a 5000 mAh battery for under $500. Strong value for money."
    }
  ]
}"#;

const HINDI_EXAMPLE: &str = r#"{
  "recommendations": [
    {
      "productId": 4,
      "reason": "16GB RAM और Snapdragon 8 Gen 3 प्रोसेसर, वह भी कम कीमत में। 5400 mAh बैटरी पूरे दिन चलती है।"
    }
  ]
}"#;

/// Build the single instruction string sent to the model.
///
/// Pure and infallible: the same preference and catalog always produce the
/// same prompt.
pub fn build_prompt(preference: &str, catalog: &Catalog) -> String {
    let language = detect_language(preference);
    let catalog_json =
        serde_json::to_string_pretty(catalog.products()).unwrap_or_else(|_| "[]".to_owned());

    format!(
        "User preference (respond in {language}): {preference}

Available products as JSON:

{catalog_json}

Pick the products that best match the preference. Weigh:
- the price range or budget mentioned
- camera quality, if mentioned
- performance needs
- brand preferences
- specific features asked for
- battery life
- price-to-value ratio

Output rules:
1. Write every reason in {language}, the language of the user's input.
2. Reply with exactly one JSON object of this shape:
{{
  \"recommendations\": [
    {{
      \"productId\": <integer id of a product from the list above>,
      \"reason\": \"<short explanation in {language} naming the highlights that fit the preference>\"
    }}
  ]
}}
3. Only use productId values that appear in the product list.
4. Order recommendations from best to weakest match and return at most 5.
5. If nothing fits, return {{\"recommendations\": []}}.

Example reply in English:
{ENGLISH_EXAMPLE}

Example reply in Hindi:
{HINDI_EXAMPLE}

Return ONLY the JSON object: no markdown, no code fences, no extra text."
    )
}
