//! Classification results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detection::Fields;

/// Minimum confidence for a result to be used.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.3;

/// Type assigned when classification fails.
pub const UNKNOWN_TYPE: &str = "unknown";

/// The verdict for one candidate region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Content type, e.g. `teaser-component`.
    pub content_type: String,

    /// Confidence in [0, 1].
    pub confidence: f64,

    /// Extracted field values.
    #[serde(default)]
    pub fields: Fields,

    /// File name of the source document.
    pub source_file: String,

    /// Outer HTML of the region.
    #[serde(default)]
    pub html_snippet: String,
}

impl ClassificationResult {
    /// Create a result. Confidence is clamped to [0, 1]; NaN becomes 0.
    pub fn new(
        content_type: impl Into<String>,
        confidence: f64,
        fields: Fields,
        source_file: impl Into<String>,
        html_snippet: impl Into<String>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            content_type: content_type.into(),
            confidence,
            fields,
            source_file: source_file.into(),
            html_snippet: html_snippet.into(),
        }
    }

    /// The degraded result: unknown type, zero confidence, no fields.
    pub fn unknown(source_file: impl Into<String>, html_snippet: impl Into<String>) -> Self {
        Self::new(UNKNOWN_TYPE, 0.0, Fields::new(), source_file, html_snippet)
    }

    /// Confident enough to use.
    pub fn looks_good(&self) -> bool {
        self.confidence >= ACCEPTANCE_THRESHOLD
    }

    /// Whether this is the degraded result type.
    pub fn is_unknown(&self) -> bool {
        self.content_type == UNKNOWN_TYPE
    }

    /// Field value as text, `None` when absent or empty.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(value_text)
            .filter(|text| !text.trim().is_empty())
    }
}

/// Flatten a JSON value to display text.
///
/// Strings are returned as-is, lists of strings are newline-joined, null is
/// empty and everything else is compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
