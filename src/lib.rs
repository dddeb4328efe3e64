//! Extgallery - self-hosted extension gallery
//!
//! This library ingests VSIX extension packages into a directory-backed
//! store and serves the resulting catalog from an in-memory cache.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Gallery logic: manifests, store, catalog, ingestion
//! - [`infra`] - Infrastructure layer (filesystem, archives, directories)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
