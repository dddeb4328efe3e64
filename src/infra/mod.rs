//! Infrastructure layer
//!
//! Handles filesystem access, archive extraction and directory layout.

pub mod archive;
pub mod dirs;
pub mod filesystem;
