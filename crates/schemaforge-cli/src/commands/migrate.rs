//! Migrate command - run the whole pipeline over a folder of pages.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use schemaforge::{
    report, AnthropicProvider, JsonFileStore, LlmConfig, MigrationConfig, Migrator, MockProvider,
    OllamaProvider, OpenAIProvider,
};

use crate::cli::LlmProviderChoice;

pub struct MigrateArgs {
    pub dir: PathBuf,
    pub output: PathBuf,
    pub store: PathBuf,
    pub llm: LlmProviderChoice,
    pub model: Option<String>,
    pub min_confidence: f64,
    pub retries: u32,
}

pub fn run(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.dir.is_dir() {
        return Err(format!("Folder not found: {}", args.dir.display()).into());
    }
    if !(0.0..=1.0).contains(&args.min_confidence) {
        return Err(format!(
            "--min-confidence must be between 0 and 1, got {}",
            args.min_confidence
        )
        .into());
    }

    let llm_config = llm_config(&args.llm, args.model.as_deref(), args.retries);
    let config = MigrationConfig::default()
        .with_min_confidence(args.min_confidence)
        .with_llm_config(llm_config.clone());

    // A store that cannot be created aborts before any page is read.
    let store = JsonFileStore::open(&args.store)?;

    println!(
        "{} {} {}",
        "Migrating".cyan().bold(),
        args.dir.display().to_string().white(),
        format!("(llm: {})", args.llm).dimmed()
    );

    let migrator = Migrator::new(config, Arc::new(store));
    let migrator = match args.llm {
        LlmProviderChoice::None => migrator,
        LlmProviderChoice::Anthropic => {
            migrator.with_llm(AnthropicProvider::from_env_with_config(llm_config)?)
        }
        LlmProviderChoice::OpenAI => {
            migrator.with_llm(OpenAIProvider::from_env_with_config(llm_config)?)
        }
        LlmProviderChoice::Ollama => migrator.with_llm(OllamaProvider::with_config(llm_config)?),
        LlmProviderChoice::Mock => migrator.with_llm(MockProvider::new().with_config(llm_config)),
    };

    let result = migrator.migrate(&args.dir)?;
    let paths = report::write_artifacts(&result, &args.output)?;
    let summary = &result.summary;

    println!();
    println!(
        "Analyzed {} pages, {} regions, {} accepted components",
        summary.pages_analyzed.to_string().white().bold(),
        summary.regions_found,
        summary.results_accepted.to_string().white().bold()
    );
    println!(
        "Created {} schemas, extracted {} records",
        summary.schemas_created.to_string().green().bold(),
        summary.content_extracted
    );

    if !result.schemas.is_empty() {
        println!();
        println!("{}", "Schemas:".yellow().bold());
        for (content_type, schema) in &result.schemas {
            let instances = result
                .results
                .iter()
                .filter(|r| &r.content_type == content_type)
                .count();
            println!(
                "  {:30} {:>3} fields {:>4} instances",
                content_type,
                schema.fields.len(),
                instances
            );
        }
    }

    println!();
    if result.patterns.is_empty() {
        println!("{}", "No reusable patterns promoted".dimmed());
    } else {
        println!("{}", "Reusable patterns:".yellow().bold());
        for pattern in result.patterns.values() {
            println!(
                "  {:30} score {:.2}  {} instances from {} files",
                pattern.template.component_name.green(),
                pattern.reusability_score,
                pattern.instances_count,
                pattern.distinct_files()
            );
        }
    }

    println!();
    for path in paths.all() {
        println!("{} {}", "Wrote".green().bold(), path.display().to_string().white());
    }
    println!(
        "Completed in {:.1}s, store at {}",
        summary.elapsed_secs,
        args.store.display()
    );

    Ok(())
}

/// Provider settings; without `--model` each provider keeps its usual model.
fn llm_config(choice: &LlmProviderChoice, model: Option<&str>, retries: u32) -> LlmConfig {
    let base = LlmConfig::default();
    let model = match (model, choice) {
        (Some(model), _) => model.to_string(),
        (None, LlmProviderChoice::OpenAI) => "gpt-4o".to_string(),
        (None, LlmProviderChoice::Ollama) => "llama3.2".to_string(),
        (None, LlmProviderChoice::Mock) => "mock".to_string(),
        (None, _) => base.model.clone(),
    };
    let backoff_ms = base.retry_backoff_ms;
    base.with_model(model).with_retries(retries, backoff_ms)
}
