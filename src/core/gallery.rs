//! Gallery service
//!
//! Entry point for the transport layer: list the catalog, fetch one
//! package, ingest an uploaded archive. Owns the store, the catalog and
//! the extractor for the lifetime of the process.
//!
//! Ingestion runs stage → parse → lock → commit → catalog update. The
//! catalog is only touched after the commit succeeded, and the staging
//! directory is removed on every path out of [`Gallery::ingest`].

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncRead;

use crate::core::catalog::CatalogCache;
use crate::core::global_config::GlobalConfig;
use crate::core::manifest::{self, Package};
use crate::core::store::PackageStore;
use crate::error::{GalleryError, Result};
use crate::infra::archive::{ArchiveExtractor, StagingDir};
use crate::infra::dirs::GalleryDirs;

/// The package catalog and its ingestion pipeline
#[derive(Debug)]
pub struct Gallery {
    store: Arc<PackageStore>,
    catalog: CatalogCache,
    extractor: ArchiveExtractor,
}

impl Gallery {
    /// Create a gallery over the directories in `dirs`
    pub fn new(dirs: &GalleryDirs) -> Self {
        let store = Arc::new(PackageStore::new(dirs.extensions_dir()));
        Self {
            catalog: CatalogCache::new(Arc::clone(&store)),
            store,
            extractor: ArchiveExtractor::new(dirs.staging_dir()),
        }
    }

    /// Create a gallery rooted at `root`
    pub fn at_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(&GalleryDirs::with_paths(root.to_path_buf(), root.to_path_buf()))
    }

    /// Create a gallery from directories and global configuration
    pub fn open(dirs: &GalleryDirs, config: &GlobalConfig) -> Self {
        let dirs = dirs.clone().with_root(config.gallery_root(dirs));
        tracing::debug!("Opening gallery at {}", dirs.root_dir().display());
        let mut gallery = Self::new(&dirs);
        gallery.extractor = gallery
            .extractor
            .with_max_archive_size(config.max_archive_size());
        gallery
    }

    /// The underlying package store
    pub fn store(&self) -> &PackageStore {
        &self.store
    }

    /// The catalog cache
    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    /// All packages, newest first
    pub async fn list(&self) -> Result<Vec<Package>> {
        self.catalog.get_all().await
    }

    /// One package by ID
    pub async fn get(&self, id: &str) -> Result<Package> {
        self.catalog.get_by_id(id).await
    }

    /// Ingest an uploaded archive
    ///
    /// Returns the record as committed. Any uploaded version is accepted,
    /// including one older than the stored version.
    pub async fn ingest<R>(
        &self,
        reader: R,
        repository: Option<&str>,
        issue_tracker: Option<&str>,
    ) -> Result<Package>
    where
        R: AsyncRead + Unpin,
    {
        let staging = self.extractor.stage(reader).await?;
        let result = self.ingest_staged(&staging, repository, issue_tracker).await;

        if let Err(e) = staging.close().await {
            tracing::warn!("{}", e);
        }
        result
    }

    /// Ingest an archive file from disk
    pub async fn ingest_file(
        &self,
        path: &Path,
        repository: Option<&str>,
        issue_tracker: Option<&str>,
    ) -> Result<Package> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| GalleryError::ExtractionFailed {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
        self.ingest(file, repository, issue_tracker).await
    }

    async fn ingest_staged(
        &self,
        staging: &StagingDir,
        repository: Option<&str>,
        issue_tracker: Option<&str>,
    ) -> Result<Package> {
        let dir = staging.path().to_path_buf();
        let repository = repository.map(str::to_string);
        let issue_tracker = issue_tracker.map(str::to_string);
        let package = tokio::task::spawn_blocking(move || {
            manifest::parse_staged(&dir, repository.as_deref(), issue_tracker.as_deref())
        })
        .await
        .map_err(|e| GalleryError::InvalidManifest {
            path: manifest::manifest_path(staging.path()),
            error: e.to_string(),
        })??;

        let lock = self.store.lock(&package.id).await;
        let stored = self.store.commit(&lock, staging.path(), package).await?;
        self.catalog.upsert(stored.clone()).await?;
        drop(lock);

        tracing::info!("Ingested {} v{}", stored.id, stored.version);
        Ok(stored)
    }
}
