//! Schemaforge CLI - turn crawled HTML into CMS component schemas.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Migrate {
            dir,
            output,
            store,
            llm,
            model,
            min_confidence,
            retries,
        } => commands::migrate::run(commands::migrate::MigrateArgs {
            dir,
            output,
            store,
            llm,
            model,
            min_confidence,
            retries,
        }),

        Commands::Inspect { file, json } => commands::inspect::run(file, json, cli.verbose),

        Commands::Patterns { store, json } => commands::patterns::run(store, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
