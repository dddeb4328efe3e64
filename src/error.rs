//! Error types for extgallery
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

impl FilesystemError {
    /// Path the failed operation was acting on
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::CreateDir { path, .. }
            | Self::RemoveDir { path, .. }
            | Self::WriteFile { path, .. }
            | Self::ReadFile { path, .. } => path,
            Self::CopyFile { to, .. } => to,
        }
    }
}

/// Top-level gallery error type
#[derive(Error, Debug)]
pub enum GalleryError {
    /// The uploaded stream could not be written to the staging directory
    #[error("Failed to stage upload at '{path}': {error}")]
    ExtractionFailed { path: PathBuf, error: String },

    /// The uploaded archive exceeds the configured size limit
    #[error("Archive exceeds the maximum size of {limit} bytes")]
    ArchiveTooLarge { limit: u64 },

    /// The staged archive could not be decompressed
    #[error("Malformed archive '{path}': {error}")]
    MalformedArchive { path: PathBuf, error: String },

    /// Manifest missing, unreadable or lacking required fields
    #[error("Invalid manifest '{path}': {error}")]
    InvalidManifest { path: PathBuf, error: String },

    /// No package with this ID in the cache or on disk
    #[error("Package '{id}' not found")]
    NotFound { id: String },

    /// Filesystem error while replacing a package directory
    #[error("Failed to commit package '{id}' at '{path}': {error}")]
    StoreCommitFailed {
        id: String,
        path: PathBuf,
        error: String,
    },

    /// Filesystem error outside of a commit
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

impl GalleryError {
    /// Whether this is the caller-visible "no such package" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Wrap a filesystem failure that happened while committing `id`
    pub(crate) fn commit_failed(id: &str, error: &FilesystemError) -> Self {
        Self::StoreCommitFailed {
            id: id.to_string(),
            path: error.path().clone(),
            error: error.to_string(),
        }
    }
}

/// Result type alias for gallery operations
pub type Result<T> = std::result::Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguished() {
        let err = GalleryError::NotFound {
            id: "foo".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Package 'foo' not found");

        let err = GalleryError::InvalidManifest {
            path: PathBuf::from("x/extension.json"),
            error: "missing ID".to_string(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_commit_failed_keeps_path_and_cause() {
        let fs_err = FilesystemError::CopyFile {
            from: PathBuf::from("a"),
            to: PathBuf::from("b"),
            error: "disk full".to_string(),
        };
        let err = GalleryError::commit_failed("foo", &fs_err);
        match err {
            GalleryError::StoreCommitFailed { id, path, error } => {
                assert_eq!(id, "foo");
                assert_eq!(path, PathBuf::from("b"));
                assert!(error.contains("disk full"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
