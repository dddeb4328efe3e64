//! Extgallery CLI - self-hosted extension gallery
//!
//! Entry point for the extgallery command-line application.

use anyhow::Result;
use clap::Parser;

use extgallery::cli::output::{display_error, log_level};
use extgallery::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        log_level(cli.verbose)
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    // Run the command and handle errors
    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
