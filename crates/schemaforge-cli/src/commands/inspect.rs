//! Inspect command - list candidate regions of one page without an LLM.

use std::path::PathBuf;

use colored::Colorize;
use schemaforge::{Document, RegionFinder, SignatureMatcher};

pub fn run(file: PathBuf, json_output: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let document = Document::load(&file)?;
    let regions = RegionFinder::new().find_regions(&document);
    let matcher = SignatureMatcher::new();

    if json_output {
        let entries: Vec<serde_json::Value> = regions
            .iter()
            .enumerate()
            .map(|(index, region)| {
                let pre = matcher.match_region(region);
                serde_json::json!({
                    "index": index,
                    "label": region.label(),
                    "origin": region.origin(),
                    "word_count": region.word_count(),
                    "content_type": pre.content_type,
                    "score": pre.score,
                    "fields": pre.fields,
                })
            })
            .collect();

        let output = serde_json::json!({
            "file": document.file_name(),
            "hash": document.source().hash,
            "regions": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Regions in".cyan().bold(),
        document.file_name().white(),
        format!("({} found)", regions.len()).dimmed()
    );
    println!();

    for (index, region) in regions.iter().enumerate() {
        let pre = matcher.match_region(region);
        let content_type = if pre.is_specific() {
            pre.content_type.green()
        } else {
            pre.content_type.dimmed()
        };

        println!(
            "{:>3}. {:40} {:>5} words  {:25} {:.2}",
            index + 1,
            region.label(),
            region.word_count(),
            content_type,
            pre.score
        );

        if verbose {
            for (name, value) in &pre.fields {
                println!("       {} {}", format!("{}:", name).dimmed(), value);
            }
        }
    }

    if regions.is_empty() {
        println!("{}", "No candidate regions found".yellow());
    }

    Ok(())
}
