//! Default configuration values and well-known names

/// Manifest file name, both inside uploaded archives and in package directories
pub const MANIFEST_FILE: &str = "extension.json";

/// XML manifest file name inside uploaded archives
pub const VSIX_MANIFEST_FILE: &str = "extension.vsixmanifest";

/// File name of the stored archive inside a package directory
pub const ARCHIVE_FILE: &str = "extension.vsix";

/// Subdirectory of the gallery root holding one directory per package
pub const EXTENSIONS_SUBDIR: &str = "extensions";

/// Subdirectory of the gallery root holding upload staging directories
pub const STAGING_SUBDIR: &str = "temp";

/// Extension used for stored icon/preview images without one
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Prefix of the stored icon file name (`icon-<version>.<ext>`)
pub const ICON_PREFIX: &str = "icon";

/// Prefix of the stored preview file name (`preview-<version>.<ext>`)
pub const PREVIEW_PREFIX: &str = "preview";

/// URL path under which package directories are served
pub const EXTENSIONS_URL_BASE: &str = "/extensions/";
