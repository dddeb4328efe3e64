//! Upload staging and archive extraction
//!
//! Every upload is written to its own fresh directory under the staging
//! root and unpacked there. The directory is owned by a [`StagingDir`]
//! guard which removes it when closed or dropped, so no exit path of an
//! ingestion leaves staging files behind.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;
use zip::ZipArchive;

use crate::config::defaults::ARCHIVE_FILE;
use crate::error::{FilesystemError, GalleryError, Result};
use crate::infra::filesystem;

/// A staging directory for one in-flight upload
///
/// Removed on [`StagingDir::close`] or, failing that, on drop.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    archive_path: PathBuf,
    removed: bool,
}

impl StagingDir {
    fn new(path: PathBuf) -> Self {
        let archive_path = path.join(ARCHIVE_FILE);
        Self {
            path,
            archive_path,
            removed: false,
        }
    }

    /// Directory holding the uploaded archive and its extracted entries
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The uploaded archive as written to the staging directory
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Remove the staging directory
    ///
    /// On failure the guard keeps ownership and retries on drop.
    pub async fn close(mut self) -> std::result::Result<(), FilesystemError> {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(FilesystemError::RemoveDir {
                    path: self.path.clone(),
                    error: e.to_string(),
                })
            }
        }
        self.removed = true;
        tracing::debug!("Removed staging directory {}", self.path.display());
        Ok(())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match filesystem::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Removed staging directory {}", self.path.display()),
            Err(e) => tracing::warn!("Failed to remove staging directory: {}", e),
        }
    }
}

/// Writes uploads to unique staging directories and unpacks them
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    staging_root: PathBuf,
    max_archive_size: Option<u64>,
}

impl ArchiveExtractor {
    /// Create an extractor staging under `staging_root`
    pub fn new(staging_root: PathBuf) -> Self {
        Self {
            staging_root,
            max_archive_size: None,
        }
    }

    /// Reject archives larger than `limit` bytes
    #[must_use]
    pub fn with_max_archive_size(mut self, limit: Option<u64>) -> Self {
        self.max_archive_size = limit;
        self
    }

    /// Stage an uploaded archive
    ///
    /// Writes the full stream to `<staging_root>/<uuid>/extension.vsix` and
    /// unpacks it into the same directory.
    pub async fn stage<R>(&self, reader: R) -> Result<StagingDir>
    where
        R: AsyncRead + Unpin,
    {
        tokio::fs::create_dir_all(&self.staging_root)
            .await
            .map_err(|e| GalleryError::ExtractionFailed {
                path: self.staging_root.clone(),
                error: e.to_string(),
            })?;

        // create_dir (not _all) so a name collision fails instead of sharing
        let path = self.staging_root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir(&path)
            .await
            .map_err(|e| GalleryError::ExtractionFailed {
                path: path.clone(),
                error: e.to_string(),
            })?;
        let staging = StagingDir::new(path);
        tracing::debug!("Created staging directory {}", staging.path().display());

        let size = self.write_archive(reader, staging.archive_path()).await?;

        let archive = staging.archive_path().to_path_buf();
        let dest = staging.path().to_path_buf();
        let entries = tokio::task::spawn_blocking(move || unpack_archive(&archive, &dest))
            .await
            .map_err(|e| GalleryError::ExtractionFailed {
                path: staging.path().to_path_buf(),
                error: e.to_string(),
            })??;

        tracing::info!(
            "Staged {} byte archive with {} entries at {}",
            size,
            entries,
            staging.path().display()
        );
        Ok(staging)
    }

    async fn write_archive<R>(&self, reader: R, dest: &Path) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let io_error = |e: io::Error| GalleryError::ExtractionFailed {
            path: dest.to_path_buf(),
            error: e.to_string(),
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(io_error)?;

        let written = match self.max_archive_size {
            Some(limit) => {
                // One byte past the limit is enough to detect an oversized upload
                let mut limited = reader.take(limit.saturating_add(1));
                let written = tokio::io::copy(&mut limited, &mut file)
                    .await
                    .map_err(io_error)?;
                if written > limit {
                    return Err(GalleryError::ArchiveTooLarge { limit });
                }
                written
            }
            None => {
                let mut reader = reader;
                tokio::io::copy(&mut reader, &mut file)
                    .await
                    .map_err(io_error)?
            }
        };

        file.flush().await.map_err(io_error)?;
        Ok(written)
    }
}

/// Unpack a zip archive into `dest`, returning the number of files written
///
/// Entries whose names escape `dest` are skipped, as is any entry that
/// would overwrite the archive itself.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<usize> {
    let malformed = |error: String| GalleryError::MalformedArchive {
        path: archive.to_path_buf(),
        error,
    };

    let file = File::open(archive).map_err(|e| GalleryError::ExtractionFailed {
        path: archive.to_path_buf(),
        error: e.to_string(),
    })?;
    let mut zip = ZipArchive::new(file).map_err(|e| malformed(e.to_string()))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| malformed(e.to_string()))?;
        let Some(target) = entry.enclosed_name().map(|p| dest.join(p)) else {
            tracing::warn!("Skipping archive entry outside staging: {}", entry.name());
            continue;
        };

        if entry.name().ends_with('/') || entry.is_dir() {
            filesystem::create_dir_all(&target).map_err(|e| extraction_failed(&e))?;
            continue;
        }
        if target == archive {
            tracing::warn!("Skipping archive entry shadowing the upload: {}", entry.name());
            continue;
        }

        if let Some(parent) = target.parent() {
            filesystem::create_dir_all(parent).map_err(|e| extraction_failed(&e))?;
        }
        let mut outfile = File::create(&target).map_err(|e| GalleryError::ExtractionFailed {
            path: target.clone(),
            error: e.to_string(),
        })?;
        // Decompression and CRC failures surface as read errors here
        io::copy(&mut entry, &mut outfile)
            .map_err(|e| malformed(format!("{}: {e}", entry.name())))?;
        written += 1;
    }

    Ok(written)
}

fn extraction_failed(error: &FilesystemError) -> GalleryError {
    GalleryError::ExtractionFailed {
        path: error.path().clone(),
        error: error.to_string(),
    }
}
