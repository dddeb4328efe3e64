//! Core gallery logic
//!
//! # Submodules
//!
//! - [`manifest`] - Manifest parsing and validation
//! - [`vsix_manifest`] - XML manifest reading for uploaded archives
//! - [`store`] - Directory-backed package store with per-ID locks
//! - [`catalog`] - Lazily loaded in-memory catalog
//! - [`gallery`] - Ingestion pipeline and query entry points
//! - [`presentation`] - Release years, download names and asset URLs
//! - [`global_config`] - Global configuration management

pub mod catalog;
pub mod gallery;
pub mod global_config;
pub mod manifest;
pub mod presentation;
pub mod store;
pub mod vsix_manifest;
