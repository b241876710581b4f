//! Schemaforge: turns crawled HTML pages into reusable CMS component schemas.
//!
//! A migration finds candidate content regions in each page, classifies them
//! with rule-based signatures and an optional LLM, synthesizes one typed
//! schema per content type and scores which types recur across pages often
//! enough to become reusable components.
//!
//! # Core Principles
//!
//! - **Degrade, don't abort**: unreadable pages, LLM failures and malformed
//!   responses lower the yield of a run but never stop it
//! - **Grounded classification**: signature pre-analysis is embedded in every
//!   prompt and is the verdict when no LLM is configured
//! - **Nothing lost silently**: store failures abort the run
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use schemaforge::{JsonFileStore, MigrationConfig, Migrator};
//!
//! let store = JsonFileStore::open("migration_store").unwrap();
//! let migrator = Migrator::new(MigrationConfig::default(), Arc::new(store));
//! let result = migrator.migrate("crawled_pages").unwrap();
//!
//! println!("Schemas: {}", result.summary.schemas_created);
//! println!("Reusable: {}", result.summary.patterns_promoted);
//! ```

pub mod classify;
pub mod detection;
pub mod document;
pub mod error;
pub mod llm;
pub mod patterns;
pub mod report;
pub mod schema;
pub mod store;

mod migration;

pub use crate::migration::{
    ComponentTypeRecord, ExtractedContent, MigrationConfig, MigrationResult, MigrationSummary,
    Migrator, PageInfo,
};
pub use classify::{ClassificationResult, ClassifierConfig, ContentClassifier, TypeRegistry};
pub use detection::{
    CandidateRegion, FieldExtractor, FinderConfig, PreAnalysis, RegionFinder, SignatureMatcher,
};
pub use document::{Document, SourceMetadata};
pub use error::{ForgeError, Result};
pub use llm::{
    AnthropicProvider, LlmConfig, LlmProvider, MockProvider, OllamaProvider, OpenAIProvider,
};
pub use patterns::{PatternConfig, PatternDetector, ReusablePattern};
pub use schema::{ComponentSchema, FieldType, SchemaField, SchemaSynthesizer, SynthesizerConfig};
pub use store::{Collection, DocumentStore, JsonFileStore, MemoryStore};
