//! Get command implementation
//!
//! Implements `extgallery get <ID>`.

use anyhow::Result;

use crate::cli::output::{self, OutputConfig};
use crate::core::gallery::Gallery;

/// Execute the get command
pub async fn execute(gallery: &Gallery, id: &str, output: &OutputConfig) -> Result<()> {
    let package = gallery.get(id).await?;

    if output.json {
        return output.print_json(&package);
    }
    if output.quiet {
        return Ok(());
    }

    for line in output::package_details(&package) {
        println!("{line}");
    }

    Ok(())
}
