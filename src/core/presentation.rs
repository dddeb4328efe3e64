//! Catalog presentation helpers
//!
//! Pure functions turning stored records into what a catalog browser
//! shows: product years for host versions, the archive's download name,
//! and URLs of stored assets.

use crate::config::defaults::EXTENSIONS_URL_BASE;
use crate::core::manifest::Package;

/// Host version prefixes and the product release they belong to
const HOST_RELEASES: &[(&str, u16)] = &[("11.", 2012), ("12.", 2013), ("14.", 2015)];

/// Product release year for a host version identifier
///
/// Unknown identifiers map to `None`.
pub fn host_release(version: &str) -> Option<u16> {
    HOST_RELEASES
        .iter()
        .find(|(prefix, _)| version.starts_with(*prefix))
        .map(|&(_, year)| year)
}

/// Product releases supported by a package, in manifest order, deduplicated
pub fn supported_releases(package: &Package) -> Vec<u16> {
    let mut releases = Vec::new();
    for year in package
        .supported_versions
        .iter()
        .filter_map(|v| host_release(v))
    {
        if !releases.contains(&year) {
            releases.push(year);
        }
    }
    releases
}

/// Name under which the archive is offered for download
pub fn download_file_name(package: &Package) -> String {
    format!("{} v{}.vsix", package.name, package.version)
}

/// URL of a stored asset, relative to the server root
pub fn asset_url(package: &Package, asset: Option<&str>) -> Option<String> {
    asset.map(|name| format!("{EXTENSIONS_URL_BASE}{}/{name}", package.id))
}
