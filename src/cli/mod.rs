//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::core::gallery::Gallery;
use crate::core::global_config::GlobalConfig;
use crate::infra::dirs::GalleryDirs;
use commands::Commands;
use output::OutputConfig;

/// Extgallery - self-hosted extension gallery
///
/// Ingest VSIX packages into a gallery directory and query its catalog.
#[derive(Parser, Debug)]
#[command(name = "extgallery")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Gallery root directory (holds extensions/ and temp/)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let Some(command) = self.command else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            return Ok(());
        };

        let mut dirs = GalleryDirs::new();
        if let Some(root) = &self.root {
            dirs = dirs.with_root(root);
        }
        let config = GlobalConfig::load(&dirs)?;

        let output = OutputConfig::new(
            self.quiet || config.output.quiet.unwrap_or(false),
            self.json || config.output.json.unwrap_or(false),
            self.verbose,
        );
        let gallery = Gallery::open(&dirs, &config);

        command.run(&gallery, &output).await
    }
}
