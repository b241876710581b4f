//! Document loading and markup helpers.

pub mod dom;
mod source;

pub use source::{Document, SourceMetadata};
