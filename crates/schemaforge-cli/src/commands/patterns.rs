//! Patterns command - re-run pattern detection over a store's extracted data.

use std::path::PathBuf;

use colored::Colorize;
use schemaforge::{
    ClassificationResult, Collection, DocumentStore, ExtractedContent, JsonFileStore,
    PatternDetector,
};
use tracing::warn;

pub fn run(store_dir: PathBuf, json_output: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !store_dir.is_dir() {
        return Err(format!(
            "Store not found: {}\nRun 'schemaforge migrate <DIR> --store {}' first.",
            store_dir.display(),
            store_dir.display()
        )
        .into());
    }

    let store = JsonFileStore::open(&store_dir)?;
    let results: Vec<ClassificationResult> = store
        .find_all(Collection::ExtractedData)?
        .into_iter()
        .filter_map(|doc| match serde_json::from_value::<ExtractedContent>(doc) {
            Ok(content) => Some(content.to_result()),
            Err(e) => {
                warn!(error = %e, "Skipping malformed extracted-data record");
                None
            }
        })
        .collect();

    let detector = PatternDetector::new();
    let analyzed = detector.analyze(&results);

    if json_output {
        let promoted: Vec<&str> = analyzed
            .iter()
            .filter(|(_, pattern)| detector.is_promoted(pattern))
            .map(|(content_type, _)| content_type.as_str())
            .collect();
        let cms_components: Vec<_> = analyzed
            .values()
            .filter(|pattern| detector.is_promoted(pattern))
            .map(|pattern| pattern.to_cms_component())
            .collect();

        let output = serde_json::json!({
            "records": results.len(),
            "patterns": analyzed,
            "promoted": promoted,
            "cms_components": cms_components,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Patterns in".cyan().bold(),
        store_dir.display().to_string().white(),
        format!("({} records)", results.len()).dimmed()
    );
    println!();

    if analyzed.is_empty() {
        println!("{}", "No content type has two or more instances".yellow());
        return Ok(());
    }

    for (content_type, pattern) in &analyzed {
        let status = if detector.is_promoted(pattern) {
            "reusable".green().bold()
        } else {
            "not promoted".dimmed()
        };
        println!(
            "  {:30} score {:.2}  {:>4} instances  {:>3} files  {}",
            content_type,
            pattern.reusability_score,
            pattern.instances_count,
            pattern.distinct_files(),
            status
        );

        if verbose {
            println!("       common fields: {}", pattern.common_fields.join(", "));
            for variant in &pattern.template.variants {
                println!(
                    "       variant {} ({} instances): {}",
                    variant.variant_name,
                    variant.instances,
                    variant.distinguishing_features.join(", ")
                );
            }
        }
    }

    Ok(())
}
