//! List command implementation
//!
//! Implements `extgallery list`.

use anyhow::Result;

use crate::cli::output::{self, status, OutputConfig};
use crate::core::gallery::Gallery;

/// Execute the list command
pub async fn execute(gallery: &Gallery, output: &OutputConfig) -> Result<()> {
    let packages = gallery.list().await?;

    if output.json {
        return output.print_json(&packages);
    }
    if output.quiet {
        return Ok(());
    }

    if packages.is_empty() {
        println!("{} No packages in the gallery", status::INFO);
        return Ok(());
    }

    for package in &packages {
        println!("{}", output::package_line(package));
    }
    println!();
    println!("{} package(s)", packages.len());

    Ok(())
}
