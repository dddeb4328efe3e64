//! Ingest command implementation
//!
//! Implements `extgallery ingest <ARCHIVE>`.

use std::path::Path;

use anyhow::Result;

use crate::cli::output::{self, status, OutputConfig};
use crate::core::gallery::Gallery;

/// Execute the ingest command
pub async fn execute(
    gallery: &Gallery,
    archive: &Path,
    repository: Option<&str>,
    issue_tracker: Option<&str>,
    output: &OutputConfig,
) -> Result<()> {
    let spinner = output
        .is_interactive()
        .then(|| output::create_spinner(&format!("Ingesting {}...", archive.display())));

    let result = gallery.ingest_file(archive, repository, issue_tracker).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let package = result?;

    if output.json {
        return output.print_json(&package);
    }
    if output.quiet {
        return Ok(());
    }

    println!(
        "{} Ingested {} v{}",
        status::SUCCESS,
        package.id,
        package.version
    );
    if output.verbose > 0 {
        for line in output::package_details(&package) {
            println!("{line}");
        }
    }

    Ok(())
}
