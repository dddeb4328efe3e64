//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod get;
pub mod ingest;
pub mod list;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::OutputConfig;
use crate::core::gallery::Gallery;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all packages in the gallery, newest first
    List,

    /// Show one package by ID
    Get {
        /// Package ID
        id: String,
    },

    /// Ingest a VSIX archive into the gallery
    Ingest {
        /// Path to the archive
        archive: PathBuf,

        /// Source repository URL to record with the package
        #[arg(long)]
        repository: Option<String>,

        /// Issue tracker URL to record with the package
        #[arg(long)]
        issue_tracker: Option<String>,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, gallery: &Gallery, output: &OutputConfig) -> Result<()> {
        match self {
            Self::List => list::execute(gallery, output).await,
            Self::Get { id } => get::execute(gallery, &id, output).await,
            Self::Ingest {
                archive,
                repository,
                issue_tracker,
            } => {
                ingest::execute(
                    gallery,
                    &archive,
                    repository.as_deref(),
                    issue_tracker.as_deref(),
                    output,
                )
                .await
            }
        }
    }
}
