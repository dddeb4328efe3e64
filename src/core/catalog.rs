//! In-memory catalog over the package store
//!
//! The catalog is filled from disk on first use and afterwards mutated in
//! place by ingestion. It never evicts and does not notice packages that
//! are removed from disk behind its back.

use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};

use crate::core::manifest::Package;
use crate::core::store::PackageStore;
use crate::error::{GalleryError, Result};

/// Lazily initialized index of all packages, newest first
#[derive(Debug)]
pub struct CatalogCache {
    store: Arc<PackageStore>,
    packages: OnceCell<RwLock<Vec<Package>>>,
}

impl CatalogCache {
    /// Create an empty, uninitialized catalog
    pub fn new(store: Arc<PackageStore>) -> Self {
        Self {
            store,
            packages: OnceCell::new(),
        }
    }

    /// Whether the initial directory scan has run
    pub fn is_initialized(&self) -> bool {
        self.packages.initialized()
    }

    /// The cached sequence, scanning the store on first access
    ///
    /// Concurrent first callers wait for a single scan. A failed scan
    /// leaves the catalog uninitialized so the next call retries.
    async fn entries(&self) -> Result<&RwLock<Vec<Package>>> {
        self.packages
            .get_or_try_init(|| async {
                let packages = self.store.load_all().await?;
                tracing::info!("Catalog initialized with {} packages", packages.len());
                Ok::<_, GalleryError>(RwLock::new(packages))
            })
            .await
    }

    /// All packages
    pub async fn get_all(&self) -> Result<Vec<Package>> {
        Ok(self.entries().await?.read().await.clone())
    }

    /// One package, from the catalog or straight from disk
    ///
    /// A package found only on disk is returned without being added.
    pub async fn get_by_id(&self, id: &str) -> Result<Package> {
        let cached = {
            let packages = self.entries().await?.read().await;
            packages.iter().find(|p| p.id == id).cloned()
        };

        match cached {
            Some(package) => Ok(package),
            None => {
                tracing::debug!("Catalog miss for '{}', reading from disk", id);
                self.store.load(id).await
            }
        }
    }

    /// Replace the entry for `package.id` with `package`
    ///
    /// The sequence is not re-sorted; the record is inserted ahead of
    /// every entry published before it.
    pub async fn upsert(&self, package: Package) -> Result<()> {
        let mut packages = self.entries().await?.write().await;
        packages.retain(|p| p.id != package.id);
        let index = packages.partition_point(|p| p.date_published >= package.date_published);
        tracing::debug!("Catalog upsert of '{}' at position {}", package.id, index);
        packages.insert(index, package);
        Ok(())
    }
}
