//! sf - Simple-features command-line interface
//!
//! Reads feature tables from JSON documents, runs casts and metadata
//! operations on them, and writes the results back out.

mod cli;
mod commands;
mod config_loader;
mod document;
mod errors;
mod output;
mod output_types;

use clap::Parser;
use cli::Cli;

fn main() {
    // Logs go to stderr so stdout stays parseable under --json
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(error) = commands::execute(cli) {
        errors::from_anyhow(error).display();
        std::process::exit(1);
    }
}
