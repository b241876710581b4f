//! Schema validation gate and field-name normalization.
//!
//! Field names follow one canonical pattern, `^[a-z][a-z0-9_]*$`, at most 50
//! characters. A schema is accepted with at least one field and a non-empty
//! title; a literal `title` field is not required.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::component::ComponentSchema;

/// Longest accepted field name.
pub const MAX_FIELD_NAME_LEN: usize = 50;

static FIELD_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// Why a schema was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("schema has no fields")]
    NoFields,

    #[error("schema title is empty")]
    EmptyTitle,

    #[error("field name '{0}' is not a lowercase identifier")]
    InvalidFieldName(String),

    #[error("field name '{0}' is longer than 50 characters")]
    FieldNameTooLong(String),

    #[error("field name '{0}' appears more than once")]
    DuplicateField(String),
}

/// Every violation in a schema; empty means valid.
pub fn validate(schema: &ComponentSchema) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    if schema.fields.is_empty() {
        violations.push(SchemaViolation::NoFields);
    }
    if schema.title.trim().is_empty() {
        violations.push(SchemaViolation::EmptyTitle);
    }

    let mut seen = HashSet::new();
    for field in &schema.fields {
        let name = &field.name;
        if name.chars().count() > MAX_FIELD_NAME_LEN {
            violations.push(SchemaViolation::FieldNameTooLong(name.clone()));
        } else if !FIELD_NAME.is_match(name) {
            violations.push(SchemaViolation::InvalidFieldName(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            violations.push(SchemaViolation::DuplicateField(name.clone()));
        }
    }

    violations
}

/// Whether a schema passes validation.
pub fn is_valid(schema: &ComponentSchema) -> bool {
    validate(schema).is_empty()
}

/// Rewrite a proposed name toward the canonical pattern.
///
/// Lowercases (splitting camelCase), turns any run of non-alphanumeric
/// characters into one underscore and trims underscores from both ends.
/// Names that still do not match (leading digit, too long) are left for
/// validation to reject.
pub fn normalize_field_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_lower = false;

    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }

    out.trim_matches('_').to_string()
}
