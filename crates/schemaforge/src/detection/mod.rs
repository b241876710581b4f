//! Heuristic content detection: region finding, signature pre-classification
//! and direct field fallback.

mod fields;
mod region;
mod signature;

pub use fields::FieldExtractor;
pub use region::{CandidateRegion, FinderConfig, RegionFinder, RegionOrigin};
pub use signature::{Fields, PreAnalysis, Signature, SignatureMatcher, GENERIC_CONTENT};
