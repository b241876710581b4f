//! Region classification: signature pre-analysis plus an LLM verdict.

mod classifier;
mod json;
mod registry;
mod result;

pub use classifier::{ClassifierConfig, ContentClassifier};
pub use json::{extract_json_object, find_json_object};
pub use registry::TypeRegistry;
pub use result::{value_text, ClassificationResult, ACCEPTANCE_THRESHOLD, UNKNOWN_TYPE};
