//! Structural fingerprints for variant grouping.
//!
//! An instance's fingerprint is the sorted list of `field:kind:bucket`
//! entries. Bucketing lengths instead of using exact values keeps
//! near-identical instances in one variant.
//!
//! | Value  | short    | medium    | long      |
//! |--------|----------|-----------|-----------|
//! | string | ≤ 50 ch  | ≤ 200 ch  | > 200 ch  |
//! | list   | ≤ 3 items| ≤ 10 items| > 10 items|
//!
//! Any other value is bucketed as `other`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detection::Fields;

/// Length bucket of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthBucket {
    Short,
    Medium,
    Long,
    Other,
}

impl LengthBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthBucket::Short => "short",
            LengthBucket::Medium => "medium",
            LengthBucket::Long => "long",
            LengthBucket::Other => "other",
        }
    }

    fn of(len: usize, short: usize, medium: usize) -> Self {
        if len <= short {
            LengthBucket::Short
        } else if len <= medium {
            LengthBucket::Medium
        } else {
            LengthBucket::Long
        }
    }
}

/// Kind tag of a value: `str`, `list`, `map`, `number`, `bool` or `null`.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Bucket a value by length.
pub fn length_bucket(value: &Value) -> LengthBucket {
    match value {
        Value::String(s) => LengthBucket::of(s.chars().count(), 50, 200),
        Value::Array(items) => LengthBucket::of(items.len(), 3, 10),
        _ => LengthBucket::Other,
    }
}

/// Sorted `field:kind:bucket` entries for one instance.
pub fn fingerprint(fields: &Fields) -> Vec<String> {
    let mut entries: Vec<String> = fields
        .iter()
        .map(|(name, value)| {
            format!("{}:{}:{}", name, value_kind(value), length_bucket(value).as_str())
        })
        .collect();
    entries.sort();
    entries
}
