//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use extgallery::core::gallery::Gallery;
use tempfile::TempDir;
use zip::write::FileOptions;

/// Test gallery context
///
/// Creates a temporary gallery root and provides utilities for building
/// archives and inspecting the on-disk layout.
#[allow(dead_code)]
pub struct TestGallery {
    /// Temporary directory used as the gallery root
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestGallery {
    /// Create a new test gallery in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the gallery root
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Open a gallery service over this root
    pub fn gallery(&self) -> Gallery {
        Gallery::at_root(self.dir.path())
    }

    /// Directory of a stored package
    pub fn package_dir(&self, id: &str) -> PathBuf {
        self.dir.path().join("extensions").join(id)
    }

    /// Names of the package directories under `extensions/`
    pub fn package_dirs(&self) -> Vec<String> {
        list_names(&self.dir.path().join("extensions"))
    }

    /// Names of the entries left under the staging area
    pub fn staging_entries(&self) -> Vec<String> {
        list_names(&self.dir.path().join("temp"))
    }

    /// Files stored for one package
    pub fn package_files(&self, id: &str) -> Vec<String> {
        list_names(&self.package_dir(id))
    }

    /// Write archive bytes to a file outside the gallery layout
    pub fn write_archive(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join("uploads").join(name);
        std::fs::create_dir_all(path.parent().expect("upload path has a parent"))
            .expect("Failed to create upload directory");
        std::fs::write(&path, bytes).expect("Failed to write archive");
        path
    }
}

impl Default for TestGallery {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a VSIX archive in memory from a manifest and extra entries
pub fn vsix(manifest: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    archive("extension.json", manifest, files)
}

/// Build a VSIX archive in memory around an `extension.vsixmanifest`
#[allow(dead_code)]
pub fn vsix_xml(manifest: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    archive("extension.vsixmanifest", manifest, files)
}

fn archive(manifest_name: &str, manifest: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file(manifest_name, FileOptions::default())
        .expect("Failed to start manifest entry");
    zip.write_all(manifest.as_bytes())
        .expect("Failed to write manifest entry");
    for (name, content) in files {
        zip.start_file(*name, FileOptions::default())
            .expect("Failed to start archive entry");
        zip.write_all(content).expect("Failed to write archive entry");
    }
    zip.finish().expect("Failed to finish archive").into_inner()
}

/// Manifest JSON for a package
pub fn manifest(id: &str, version: &str, icon: Option<&str>, preview: Option<&str>) -> String {
    serde_json::json!({
        "ID": id,
        "Name": format!("{id} extension"),
        "Version": version,
        "Icon": icon,
        "Preview": preview,
        "SupportedVersions": ["12.0", "14.0"],
    })
    .to_string()
}

/// Schema 2.0 `extension.vsixmanifest` for a package
#[allow(dead_code)]
pub fn xml_manifest(id: &str, version: &str, icon: Option<&str>) -> String {
    let icon = icon
        .map(|icon| format!("<Icon>{icon}</Icon>"))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<PackageManifest Version="2.0.0" xmlns="http://schemas.microsoft.com/developer/vsx-schema/2011">
  <Metadata>
    <Identity Id="{id}" Version="{version}" Language="en-US" Publisher="Test" />
    <DisplayName>{id} extension</DisplayName>
    {icon}
  </Metadata>
  <Installation>
    <InstallationTarget Id="Microsoft.VisualStudio.Pro" Version="[12.0,15.0)" />
  </Installation>
</PackageManifest>"#
    )
}

/// A minimal PNG signature, enough to stand in for an image
#[allow(dead_code)]
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

fn list_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
