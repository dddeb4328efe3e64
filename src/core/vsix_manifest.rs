//! VSIX manifest (extension.vsixmanifest) reading
//!
//! Uploaded archives describe themselves in XML. Both schema generations
//! are understood:
//!
//! ```text
//! 2.0  <PackageManifest>
//!        <Metadata>
//!          <Identity Id="..." Version="..."/>
//!          <DisplayName>...</DisplayName>
//!          <Icon>...</Icon>  <PreviewImage>...</PreviewImage>
//!        </Metadata>
//!        <Installation><InstallationTarget Version="[12.0,15.0)"/></Installation>
//!      </PackageManifest>
//!
//! 1.0  <Vsix>
//!        <Identifier Id="...">
//!          <Name>...</Name>  <Version>...</Version>
//!          <Icon>...</Icon>  <PreviewImage>...</PreviewImage>
//!          <SupportedProducts><VisualStudio Version="11.0"/></SupportedProducts>
//!        </Identifier>
//!      </Vsix>
//! ```
//!
//! The result is the same lenient document the JSON reader produces, so
//! validation is shared.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::manifest::ManifestDocument;
use crate::error::{GalleryError, Result};
use crate::infra::filesystem;

/// Host versions a version range is expanded into
const KNOWN_HOST_VERSIONS: &[&str] = &["11.0", "12.0", "14.0"];

/// Read and parse an `extension.vsixmanifest` file
pub(crate) fn read_document(path: &Path) -> Result<ManifestDocument> {
    let invalid = |error: String| GalleryError::InvalidManifest {
        path: path.to_path_buf(),
        error,
    };

    let content = filesystem::read_file(path).map_err(|e| invalid(e.to_string()))?;
    parse_document(content.trim_start_matches('\u{feff}')).map_err(invalid)
}

/// Parse manifest XML into a lenient document
pub(crate) fn parse_document(xml: &str) -> std::result::Result<ManifestDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut document = ManifestDocument::default();
    let mut versions = Vec::new();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(element) => {
                read_attributes(&element, &path, &mut document, &mut versions)?;
                path.push(local_name(&element));
            }
            Event::Empty(element) => {
                read_attributes(&element, &path, &mut document, &mut versions)?;
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                read_text(&path, text.trim(), &mut document);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut supported: Vec<String> = Vec::new();
    for version in versions {
        if !supported.contains(&version) {
            supported.push(version);
        }
    }
    if !supported.is_empty() {
        document.supported_versions = Some(supported);
    }

    Ok(document)
}

/// Expand an installation target version or range into host versions
///
/// `[12.0,15.0)` yields the lower bound followed by every known host
/// version inside the range. A plain version yields itself.
pub(crate) fn expand_version_range(range: &str) -> Vec<String> {
    let range = range.trim();
    let Some(inner) = range.strip_prefix(['[', '(']) else {
        return if range.is_empty() {
            Vec::new()
        } else {
            vec![range.to_string()]
        };
    };

    let upper_inclusive = inner.ends_with(']');
    let inner = inner.trim_end_matches([']', ')']);
    let (lower, upper) = inner.split_once(',').unwrap_or((inner, inner));
    let (lower, upper) = (lower.trim(), upper.trim());

    let mut versions = Vec::new();
    if !lower.is_empty() {
        versions.push(lower.to_string());
    }

    let lower_major = major(lower).unwrap_or(0);
    let upper_major = major(upper);
    for known in KNOWN_HOST_VERSIONS {
        let Some(known_major) = major(known) else {
            continue;
        };
        let in_range = known_major >= lower_major
            && match upper_major {
                None => true,
                Some(upper) if upper_inclusive => known_major <= upper,
                Some(upper) => known_major < upper,
            };
        if in_range && !versions.iter().any(|v| major(v) == Some(known_major)) {
            versions.push((*known).to_string());
        }
    }
    versions
}

fn major(version: &str) -> Option<u32> {
    version.split('.').next()?.trim().parse().ok()
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn read_attributes(
    element: &BytesStart<'_>,
    parents: &[String],
    document: &mut ManifestDocument,
    versions: &mut Vec<String>,
) -> std::result::Result<(), String> {
    let name = local_name(element);
    let parent = parents.last().map(String::as_str);

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let value = attribute
            .unescape_value()
            .map_err(|e| e.to_string())?
            .trim()
            .to_string();

        match (name.as_str(), parent, attribute.key.local_name().as_ref()) {
            ("Identity" | "Identifier", _, b"Id") => document.id = Some(value),
            ("Identity", _, b"Version") => document.version = Some(value),
            ("InstallationTarget", _, b"Version") => {
                versions.extend(expand_version_range(&value));
            }
            ("VisualStudio", Some("SupportedProducts"), b"Version") => versions.push(value),
            _ => {}
        }
    }
    Ok(())
}

fn read_text(path: &[String], text: &str, document: &mut ManifestDocument) {
    let current = path.last().map(String::as_str);
    let parent = path
        .len()
        .checked_sub(2)
        .and_then(|i| path.get(i))
        .map(String::as_str);

    let value = Some(text.to_string());
    match (current, parent) {
        (Some("DisplayName"), _) | (Some("Name"), Some("Identifier")) => document.name = value,
        (Some("Version"), Some("Identifier")) => document.version = value,
        (Some("Icon"), _) => document.icon = value,
        (Some("PreviewImage"), _) => document.preview = value,
        _ => {}
    }
}
