//! Package manifest parsing and validation
//!
//! A manifest describes one version of a package. Uploaded archives carry
//! an `extension.vsixmanifest` (see [`crate::core::vsix_manifest`]) or an
//! `extension.json`. Stored package directories always hold
//! `extension.json`: the record as committed, with `DatePublished` set
//! and asset names rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::defaults::{MANIFEST_FILE, VSIX_MANIFEST_FILE};
use crate::core::vsix_manifest;
use crate::error::{GalleryError, Result};
use crate::infra::filesystem;

/// One package version as stored on disk and served to clients
///
/// Field names follow the persisted JSON layout (`ID`, `Name`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    /// Stable identifier, also the package directory name
    #[serde(rename = "ID")]
    pub id: String,

    /// Display name
    pub name: String,

    /// Version string (no format enforced)
    pub version: String,

    /// Ingestion timestamp, the catalog's sort key
    pub date_published: DateTime<Utc>,

    /// Icon file name relative to the package directory
    pub icon: Option<String>,

    /// Preview image file name relative to the package directory
    pub preview: Option<String>,

    /// Host version identifiers the package supports
    #[serde(default)]
    pub supported_versions: Vec<String>,

    /// Source repository URL supplied at upload time
    pub repository: Option<String>,

    /// Issue tracker URL supplied at upload time
    pub issue_tracker: Option<String>,
}

impl Package {
    /// Serialize to the persisted JSON form
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Manifest as found on disk, before validation
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ManifestDocument {
    #[serde(rename = "ID")]
    pub(crate) id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) date_published: Option<DateTime<Utc>>,
    pub(crate) icon: Option<String>,
    pub(crate) preview: Option<String>,
    pub(crate) supported_versions: Option<Vec<String>>,
    pub(crate) repository: Option<String>,
    pub(crate) issue_tracker: Option<String>,
}

/// Path of the manifest file inside `dir`
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// Check that an ID can be used as a single directory name
pub fn validate_id(id: &str) -> std::result::Result<(), String> {
    if id.trim().is_empty() {
        return Err("ID must not be empty".to_string());
    }
    if id == "." || id == ".." {
        return Err(format!("ID '{id}' is not a valid directory name"));
    }
    if id.contains(['/', '\\', '\0']) {
        return Err(format!("ID '{id}' must not contain path separators"));
    }
    Ok(())
}

/// Parse the manifest of a freshly extracted archive
///
/// `extension.vsixmanifest` is preferred; `extension.json` is read when the
/// archive has no XML manifest. `DatePublished` is set to the current time
/// and the caller-supplied repository and issue tracker replace whatever
/// the archive carried.
pub fn parse_staged(
    dir: &Path,
    repository: Option<&str>,
    issue_tracker: Option<&str>,
) -> Result<Package> {
    let vsix_path = dir.join(VSIX_MANIFEST_FILE);
    let (path, document) = if vsix_path.is_file() {
        let document = vsix_manifest::read_document(&vsix_path)?;
        (vsix_path, document)
    } else {
        let path = manifest_path(dir);
        let document = read_document(&path)?;
        (path, document)
    };
    let mut package = into_package(&path, document, Some(Utc::now()))?;

    package.repository = non_empty(repository);
    package.issue_tracker = non_empty(issue_tracker);

    tracing::debug!(
        "Parsed staged manifest for {} v{}",
        package.id,
        package.version
    );
    Ok(package)
}

/// Parse the manifest of a committed package directory
pub fn parse_persisted(dir: &Path) -> Result<Package> {
    let path = manifest_path(dir);
    let document = read_document(&path)?;
    into_package(&path, document, None)
}

fn read_document(path: &Path) -> Result<ManifestDocument> {
    let content = filesystem::read_file(path).map_err(|e| GalleryError::InvalidManifest {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    // Tolerate a UTF-8 byte order mark
    let content = content.trim_start_matches('\u{feff}');

    serde_json::from_str(content).map_err(|e| GalleryError::InvalidManifest {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

fn into_package(
    path: &Path,
    document: ManifestDocument,
    published: Option<DateTime<Utc>>,
) -> Result<Package> {
    let invalid = |error: String| GalleryError::InvalidManifest {
        path: path.to_path_buf(),
        error,
    };

    let id = required(document.id, "ID").map_err(invalid)?;
    validate_id(&id).map_err(invalid)?;
    let name = required(document.name, "Name").map_err(invalid)?;
    let version = required(document.version, "Version").map_err(invalid)?;

    let date_published = match published.or(document.date_published) {
        Some(date) => date,
        None => return Err(invalid("missing required field 'DatePublished'".to_string())),
    };

    Ok(Package {
        id,
        name,
        version,
        date_published,
        icon: document.icon.filter(|s| !s.is_empty()),
        preview: document.preview.filter(|s| !s.is_empty()),
        supported_versions: document.supported_versions.unwrap_or_default(),
        repository: document.repository,
        issue_tracker: document.issue_tracker,
    })
}

fn required(value: Option<String>, field: &str) -> std::result::Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(format!("required field '{field}' is empty")),
        None => Err(format!("missing required field '{field}'")),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
