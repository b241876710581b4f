//! LLM collaborators for classification and schema proposals.
//!
//! The pipeline only ever asks a provider for a text completion; everything
//! it does with the answer (JSON scanning, defaulting, validation) happens in
//! the caller, so any provider may fail or return malformed text.
//!
//! # Supported Providers
//!
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`)
//! - **Ollama** - Local models, no API key needed (honours `OLLAMA_HOST`)
//! - **Mock** - Deterministic offline provider for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use schemaforge::{MigrationConfig, Migrator, MemoryStore, OllamaProvider};
//!
//! let migrator = Migrator::new(MigrationConfig::default(), Arc::new(MemoryStore::new()))
//!     .with_llm(OllamaProvider::new().unwrap());
//! ```

mod anthropic;
mod mock;
mod ollama;
mod openai;
pub(crate) mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{complete_with_retry, LlmConfig, LlmProvider};
