//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying spinners, status
//! messages, package records and errors to the user.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::core::manifest::Package;
use crate::core::presentation;

/// How command results are written
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress everything but errors
    pub quiet: bool,
    /// Write machine-readable JSON to stdout
    pub json: bool,
    /// Verbosity level from `-v` flags
    pub verbose: u8,
}

impl OutputConfig {
    /// Create an output configuration
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Whether human-readable progress and results should be shown
    pub fn is_interactive(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Print a value as pretty JSON
    pub fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Log filter directive for a `-v` count
pub fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    }
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// One-line summary of a package for listings
pub fn package_line(package: &Package) -> String {
    format!(
        "{:<32} {:<12} {}  {}",
        package.id,
        package.version,
        package.date_published.format("%Y-%m-%d"),
        package.name
    )
}

/// Multi-line description of a package
pub fn package_details(package: &Package) -> Vec<String> {
    let mut lines = vec![
        format!("{} v{}", package.name, package.version),
        format!("  ID:         {}", package.id),
        format!(
            "  Published:  {}",
            package.date_published.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        format!(
            "  Download:   {}",
            presentation::download_file_name(package)
        ),
    ];

    let releases = presentation::supported_releases(package);
    if !releases.is_empty() {
        let releases: Vec<String> = releases.iter().map(u16::to_string).collect();
        lines.push(format!("  Supports:   {}", releases.join(", ")));
    }
    if let Some(url) = presentation::asset_url(package, package.icon.as_deref()) {
        lines.push(format!("  Icon:       {url}"));
    }
    if let Some(url) = presentation::asset_url(package, package.preview.as_deref()) {
        lines.push(format!("  Preview:    {url}"));
    }
    if let Some(repo) = &package.repository {
        lines.push(format!("  Repository: {repo}"));
    }
    if let Some(tracker) = &package.issue_tracker {
        lines.push(format!("  Issues:     {tracker}"));
    }
    lines
}

/// Print an error with its cause chain
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {}", status::ERROR, error);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
