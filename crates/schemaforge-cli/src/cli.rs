//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Schemaforge: detect content components in crawled pages and build CMS schemas
#[derive(Parser)]
#[command(name = "schemaforge")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full migration over a folder of HTML pages
    Migrate {
        /// Folder containing crawled .html files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Folder for the JSON artifacts
        #[arg(short, long, default_value = "migration_output")]
        output: PathBuf,

        /// Folder for the JSON document store
        #[arg(short, long, default_value = "migration_store")]
        store: PathBuf,

        /// LLM provider used for classification and schemas
        #[arg(long, default_value = "none")]
        llm: LlmProviderChoice,

        /// Model to use (provider-specific, e.g., "gpt-4o", "llama3.2")
        #[arg(long)]
        model: Option<String>,

        /// Minimum confidence for a classification to be kept
        #[arg(long, default_value = "0.3")]
        min_confidence: f64,

        /// Extra attempts per failed LLM call
        #[arg(long, default_value = "0")]
        retries: u32,
    },

    /// List candidate regions of one page with their signature pre-analysis
    Inspect {
        /// Path to an HTML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-run pattern detection over the extracted data in a store
    Patterns {
        /// Folder of a JSON document store
        #[arg(value_name = "STORE_DIR")]
        store: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// LLM provider choice for a migration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LlmProviderChoice {
    /// No LLM - signature pre-analysis only
    #[default]
    None,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
    /// OpenAI GPT API (requires OPENAI_API_KEY)
    OpenAI,
    /// Ollama local models (honours OLLAMA_HOST)
    Ollama,
    /// Offline mock provider
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(LlmProviderChoice::None),
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: none, anthropic, openai, ollama, or mock.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::None => write!(f, "none"),
            LlmProviderChoice::Anthropic => write!(f, "anthropic"),
            LlmProviderChoice::OpenAI => write!(f, "openai"),
            LlmProviderChoice::Ollama => write!(f, "ollama"),
            LlmProviderChoice::Mock => write!(f, "mock"),
        }
    }
}
