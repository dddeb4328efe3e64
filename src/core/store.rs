//! On-disk package store
//!
//! The store is the single writer of package directories:
//!
//! ```text
//! <extensions>/
//!   <id>/
//!     extension.json          committed manifest
//!     extension.vsix          uploaded archive
//!     icon-<version>.<ext>    optional
//!     preview-<version>.<ext> optional
//! ```
//!
//! A commit replaces the whole directory. Commits for the same ID must be
//! serialized through [`PackageStore::lock`]; different IDs never contend.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::defaults::{
    ARCHIVE_FILE, DEFAULT_IMAGE_EXTENSION, ICON_PREFIX, MANIFEST_FILE, PREVIEW_PREFIX,
};
use crate::core::manifest::{self, Package};
use crate::error::{FilesystemError, GalleryError, Result};
use crate::infra::filesystem;

/// Exclusive right to modify one package directory
///
/// Held from before a commit until the catalog has been updated.
#[derive(Debug)]
pub struct PackageLock {
    id: String,
    _guard: OwnedMutexGuard<()>,
}

impl PackageLock {
    /// ID this lock was taken for
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Filesystem-backed package store
#[derive(Debug)]
pub struct PackageStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PackageStore {
    /// Create a store over the given extensions directory
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Extensions directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a package
    pub fn package_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Stored archive of a package
    pub fn archive_path(&self, id: &str) -> PathBuf {
        self.package_dir(id).join(ARCHIVE_FILE)
    }

    /// Stored icon or preview of a package, by its stored name
    pub fn asset_path(&self, id: &str, name: &str) -> PathBuf {
        self.package_dir(id).join(name)
    }

    /// Acquire the per-ID lock
    pub async fn lock(&self, id: &str) -> PackageLock {
        let lock = {
            let mut map = self.locks.lock().await;
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                map.entry(id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        PackageLock {
            id: id.to_string(),
            _guard: lock.lock_owned().await,
        }
    }

    /// Replace the package directory with a staged upload
    ///
    /// Runs the replace sequence on a blocking worker and returns the
    /// record as persisted, with icon/preview rewritten to stored names.
    /// A failure part-way leaves the directory in whatever state it reached.
    pub async fn commit(
        &self,
        lock: &PackageLock,
        staging_dir: &Path,
        package: Package,
    ) -> Result<Package> {
        let dir = self.package_dir(&package.id);
        if lock.id() != package.id {
            return Err(GalleryError::StoreCommitFailed {
                id: package.id,
                path: dir,
                error: format!("commit attempted while holding the lock for '{}'", lock.id()),
            });
        }

        let id = package.id.clone();
        let staging_dir = staging_dir.to_path_buf();
        let task_dir = dir.clone();
        tokio::task::spawn_blocking(move || commit_package(&task_dir, &staging_dir, package))
            .await
            .map_err(|e| GalleryError::StoreCommitFailed {
                id,
                path: dir,
                error: e.to_string(),
            })?
    }

    /// Read one package straight from disk
    pub async fn load(&self, id: &str) -> Result<Package> {
        if manifest::validate_id(id).is_err() {
            return Err(GalleryError::NotFound { id: id.to_string() });
        }

        let dir = self.package_dir(id);
        let id = id.to_string();
        let task_dir = dir.clone();
        tokio::task::spawn_blocking(move || load_package(&task_dir, &id))
            .await
            .map_err(|e| GalleryError::Io {
                path: dir,
                error: e.to_string(),
            })?
    }

    /// Read every package on disk, newest first
    pub async fn load_all(&self) -> Result<Vec<Package>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || load_all_packages(&root))
            .await
            .map_err(|e| GalleryError::Io {
                path: self.root.clone(),
                error: e.to_string(),
            })
    }
}

fn commit_package(dir: &Path, staging_dir: &Path, mut package: Package) -> Result<Package> {
    let id = package.id.clone();
    let failed = |e: FilesystemError| GalleryError::commit_failed(&id, &e);

    if dir.exists() {
        filesystem::remove_dir_all(dir).map_err(failed)?;
        tracing::debug!("Removed previous version of {}", id);
    }
    filesystem::create_dir_all(dir).map_err(failed)?;

    package.icon = store_asset(
        staging_dir,
        dir,
        ICON_PREFIX,
        &package.version,
        package.icon.take(),
    )
    .map_err(failed)?;
    package.preview = store_asset(
        staging_dir,
        dir,
        PREVIEW_PREFIX,
        &package.version,
        package.preview.take(),
    )
    .map_err(failed)?;

    let manifest_path = dir.join(MANIFEST_FILE);
    let json = package
        .to_json()
        .map_err(|e| GalleryError::StoreCommitFailed {
            id: id.clone(),
            path: manifest_path.clone(),
            error: e.to_string(),
        })?;
    filesystem::write_file(&manifest_path, &json).map_err(failed)?;

    filesystem::copy_file(&staging_dir.join(ARCHIVE_FILE), &dir.join(ARCHIVE_FILE))
        .map_err(failed)?;

    tracing::info!("Committed {} v{} to {}", package.id, package.version, dir.display());
    Ok(package)
}

/// Copy an icon/preview into the package directory under its stored name
///
/// Returns the field value to persist: the stored name when the file was
/// found in the staging directory, otherwise the value as given.
fn store_asset(
    staging_dir: &Path,
    package_dir: &Path,
    prefix: &str,
    version: &str,
    asset: Option<String>,
) -> std::result::Result<Option<String>, FilesystemError> {
    let Some(name) = asset else {
        return Ok(None);
    };

    let source = match staged_asset_path(staging_dir, &name) {
        Some(source) if source.is_file() => source,
        _ => {
            tracing::debug!("Asset '{}' not found in upload, keeping field as given", name);
            return Ok(Some(name));
        }
    };

    let stored = stored_asset_name(prefix, version, &source);
    filesystem::copy_file(&source, &package_dir.join(&stored))?;
    Ok(Some(stored))
}

/// Resolve an archive-relative asset reference inside the staging directory
///
/// References that are absolute or climb out of the directory resolve to
/// nothing.
fn staged_asset_path(staging_dir: &Path, name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let relative = Path::new(&normalized);

    let mut resolved = staging_dir.to_path_buf();
    let mut depth = 0;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    (depth > 0).then_some(resolved)
}

/// `<prefix>-<version>.<ext>`, with the source file's extension
pub fn stored_asset_name(prefix: &str, version: &str, source: &Path) -> String {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_IMAGE_EXTENSION);
    let version = version.replace(['/', '\\'], "_");
    format!("{prefix}-{version}.{ext}")
}

fn load_package(dir: &Path, id: &str) -> Result<Package> {
    if !manifest::manifest_path(dir).is_file() {
        return Err(GalleryError::NotFound { id: id.to_string() });
    }
    tracing::debug!("Loading {} from disk", id);
    let package = manifest::parse_persisted(dir)?;
    if package.id != id {
        return Err(GalleryError::InvalidManifest {
            path: manifest::manifest_path(dir),
            error: format!("manifest ID '{}' does not match directory '{}'", package.id, id),
        });
    }
    Ok(package)
}

fn load_all_packages(root: &Path) -> Vec<Package> {
    let mut packages = Vec::new();

    if !root.is_dir() {
        tracing::debug!("Extensions directory {} does not exist", root.display());
        return packages;
    }

    for entry in walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        if !manifest::manifest_path(dir).is_file() {
            tracing::debug!("Skipping {} (no manifest)", dir.display());
            continue;
        }

        match manifest::parse_persisted(dir) {
            Ok(package) if entry.file_name().to_str() == Some(package.id.as_str()) => {
                packages.push(package);
            }
            Ok(package) => {
                tracing::warn!(
                    "Skipping {}: manifest ID '{}' does not match directory",
                    dir.display(),
                    package.id
                );
            }
            Err(e) => tracing::warn!("Skipping {}: {}", dir.display(), e),
        }
    }

    packages.sort_by(|a, b| b.date_published.cmp(&a.date_published));
    tracing::debug!("Loaded {} packages from {}", packages.len(), root.display());
    packages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn package(id: &str, version: &str) -> Package {
        Package {
            id: id.to_string(),
            name: format!("{id} name"),
            version: version.to_string(),
            date_published: Utc::now(),
            icon: None,
            preview: None,
            supported_versions: vec!["14.0".to_string()],
            repository: None,
            issue_tracker: None,
        }
    }

    struct Fixture {
        temp: TempDir,
        store: PackageStore,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let store = PackageStore::new(temp.path().join("extensions"));
            Self { temp, store }
        }

        /// A staging directory with an archive and the given extra files
        fn staging(&self, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
            let dir = self.temp.path().join("temp").join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(ARCHIVE_FILE), format!("archive {name}")).unwrap();
            for (file, data) in files {
                let path = dir.join(file);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, data).unwrap();
            }
            dir
        }

        async fn commit(&self, staging: &Path, package: Package) -> Result<Package> {
            let lock = self.store.lock(&package.id).await;
            self.store.commit(&lock, staging, package).await
        }

        fn files(&self, id: &str) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(self.store.package_dir(id))
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    #[tokio::test]
    async fn test_commit_stores_icon_under_versioned_name() {
        let fx = Fixture::new();
        let staging = fx.staging("s1", &[("logo.png", b"icon bytes")]);
        let mut pkg = package("foo", "1.0");
        pkg.icon = Some("logo.png".to_string());

        let stored = fx.commit(&staging, pkg).await.unwrap();

        assert_eq!(stored.icon.as_deref(), Some("icon-1.0.png"));
        assert_eq!(
            std::fs::read(fx.store.asset_path("foo", "icon-1.0.png")).unwrap(),
            b"icon bytes"
        );
        assert_eq!(
            fx.files("foo"),
            vec!["extension.json", "extension.vsix", "icon-1.0.png"]
        );
        assert_eq!(
            std::fs::read_to_string(fx.store.archive_path("foo")).unwrap(),
            "archive s1"
        );
    }

    #[tokio::test]
    async fn test_commit_persists_rewritten_record() {
        let fx = Fixture::new();
        let staging = fx.staging("s1", &[("assets/preview.jpg", b"jpg")]);
        let mut pkg = package("foo", "3.1");
        pkg.preview = Some("assets\\preview.jpg".to_string());

        let stored = fx.commit(&staging, pkg).await.unwrap();
        let on_disk = fx.store.load("foo").await.unwrap();

        assert_eq!(stored.preview.as_deref(), Some("preview-3.1.jpg"));
        assert_eq!(on_disk, stored);
    }

    #[tokio::test]
    async fn test_missing_asset_keeps_field_as_given() {
        let fx = Fixture::new();
        let staging = fx.staging("s1", &[]);
        let mut pkg = package("foo", "1.0");
        pkg.icon = Some("missing.png".to_string());
        pkg.preview = Some("../../outside.png".to_string());

        let stored = fx.commit(&staging, pkg).await.unwrap();

        assert_eq!(stored.icon.as_deref(), Some("missing.png"));
        assert_eq!(stored.preview.as_deref(), Some("../../outside.png"));
        assert_eq!(fx.files("foo"), vec!["extension.json", "extension.vsix"]);
    }

    #[tokio::test]
    async fn test_commit_replaces_previous_version() {
        let fx = Fixture::new();
        let first = fx.staging("s1", &[("logo.png", b"v1"), ("shot.png", b"v1")]);
        let mut v1 = package("foo", "1.0");
        v1.icon = Some("logo.png".to_string());
        v1.preview = Some("shot.png".to_string());
        fx.commit(&first, v1).await.unwrap();

        let second = fx.staging("s2", &[]);
        let stored = fx.commit(&second, package("foo", "2.0")).await.unwrap();

        assert_eq!(stored.icon, None);
        assert_eq!(fx.files("foo"), vec!["extension.json", "extension.vsix"]);
        assert_eq!(fx.store.load("foo").await.unwrap().version, "2.0");
    }

    #[tokio::test]
    async fn test_commit_requires_matching_lock() {
        let fx = Fixture::new();
        let staging = fx.staging("s1", &[]);
        let lock = fx.store.lock("other").await;

        let err = fx
            .store
            .commit(&lock, &staging, package("foo", "1.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::StoreCommitFailed { .. }));
        assert!(!fx.store.package_dir("foo").exists());
    }

    #[tokio::test]
    async fn test_commit_without_staged_archive_fails() {
        let fx = Fixture::new();
        let staging = fx.temp.path().join("empty");
        std::fs::create_dir_all(&staging).unwrap();

        let err = fx.commit(&staging, package("foo", "1.0")).await.unwrap_err();
        assert!(matches!(err, GalleryError::StoreCommitFailed { .. }));
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let fx = Fixture::new();
        assert!(fx.store.load("missing").await.unwrap_err().is_not_found());
        assert!(fx.store.load("../etc").await.unwrap_err().is_not_found());

        std::fs::create_dir_all(fx.store.package_dir("empty")).unwrap();
        assert!(fx.store.load("empty").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_load_corrupt_manifest_is_invalid() {
        let fx = Fixture::new();
        let dir = fx.store.package_dir("bad");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), "{").unwrap();

        let err = fx.store.load("bad").await.unwrap_err();
        assert!(matches!(err, GalleryError::InvalidManifest { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_mismatched_id() {
        let fx = Fixture::new();
        let dir = fx.store.package_dir("bar");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), package("foo", "1.0").to_json().unwrap())
            .unwrap();

        let err = fx.store.load("bar").await.unwrap_err();
        assert!(matches!(err, GalleryError::InvalidManifest { .. }));
        assert!(fx.store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_all_on_missing_root_is_empty() {
        let fx = Fixture::new();
        assert!(fx.store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_all_sorts_and_skips() {
        let fx = Fixture::new();
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        for (i, id) in ["old", "new", "mid"].iter().enumerate() {
            let mut pkg = package(id, "1.0");
            pkg.date_published = base
                + Duration::days(match i {
                    0 => 0,
                    1 => 2,
                    _ => 1,
                });
            let dir = fx.store.package_dir(id);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(MANIFEST_FILE), pkg.to_json().unwrap()).unwrap();
        }
        std::fs::create_dir_all(fx.store.package_dir("no-manifest")).unwrap();
        let corrupt = fx.store.package_dir("corrupt");
        std::fs::create_dir_all(&corrupt).unwrap();
        std::fs::write(corrupt.join(MANIFEST_FILE), "not json").unwrap();
        let renamed = fx.store.package_dir("renamed");
        std::fs::create_dir_all(&renamed).unwrap();
        std::fs::write(
            renamed.join(MANIFEST_FILE),
            package("new", "9.9").to_json().unwrap(),
        )
        .unwrap();
        std::fs::write(fx.store.root().join("stray.txt"), "x").unwrap();

        let ids: Vec<String> = fx
            .store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_same_id_lock_is_exclusive() {
        let fx = Fixture::new();
        let held = fx.store.lock("foo").await;

        let waiting =
            tokio::time::timeout(std::time::Duration::from_millis(50), fx.store.lock("foo")).await;
        assert!(waiting.is_err());

        let other =
            tokio::time::timeout(std::time::Duration::from_millis(50), fx.store.lock("bar")).await;
        assert!(other.is_ok());

        drop(held);
        let acquired =
            tokio::time::timeout(std::time::Duration::from_millis(50), fx.store.lock("foo")).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let fx = Fixture::new();
        for id in ["a", "b", "c", "d"] {
            drop(fx.store.lock(id).await);
        }
        let held = fx.store.lock("e").await;
        assert_eq!(fx.store.locks.lock().await.len(), 1);

        let _other = fx.store.lock("f").await;
        let map = fx.store.locks.lock().await;
        assert!(map.contains_key("e"));
        assert!(map.contains_key("f"));
        drop(map);
        drop(held);
    }

    #[test]
    fn test_stored_asset_name() {
        assert_eq!(
            stored_asset_name("icon", "1.0", Path::new("a/logo.png")),
            "icon-1.0.png"
        );
        assert_eq!(
            stored_asset_name("preview", "2.0", Path::new("shot")),
            "preview-2.0.png"
        );
        assert_eq!(
            stored_asset_name("icon", "1/2", Path::new("x.ico")),
            "icon-1_2.ico"
        );
    }

    #[test]
    fn test_staged_asset_path_rejects_escapes() {
        let staging = Path::new("/stage");
        assert_eq!(
            staged_asset_path(staging, "res\\logo.png"),
            Some(PathBuf::from("/stage/res/logo.png"))
        );
        assert_eq!(
            staged_asset_path(staging, "./logo.png"),
            Some(PathBuf::from("/stage/logo.png"))
        );
        assert_eq!(staged_asset_path(staging, "../logo.png"), None);
        assert_eq!(staged_asset_path(staging, "/etc/passwd"), None);
        assert_eq!(staged_asset_path(staging, ""), None);
    }
}
