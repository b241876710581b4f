//! Cross-page pattern and reusability analysis.

mod detector;
mod fingerprint;
mod types;

pub use detector::{reusability_score, PatternConfig, PatternDetector};
pub use fingerprint::{fingerprint, length_bucket, value_kind, LengthBucket};
pub use types::{ComponentTemplate, FieldPattern, FieldRole, ReusablePattern, Variant};
