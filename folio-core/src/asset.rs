//! Asset resolution.
//!
//! Image items reference assets through `properties.imagePath`. A resolver
//! turns that key into something a renderer can draw: an embedded data URI,
//! a URL, or nothing. Resolution never fails loudly; a missing asset is a
//! placeholder, not an error.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use base64::Engine;

use crate::ids::ProjectId;
use crate::store::encode_file_name;

/// Outcome of resolving an asset key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
    /// Embedded `data:` URI.
    DataUri(String),
    /// Relative or absolute URL.
    Url(String),
    /// The asset could not be found.
    NotFound,
}

impl ResolvedAsset {
    /// Classify a stored reference: `data:` values are data URIs, anything
    /// else is a URL. Empty strings are not found.
    #[must_use]
    pub fn from_reference(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        if reference.is_empty() {
            Self::NotFound
        } else if is_data_uri(&reference) {
            Self::DataUri(reference)
        } else {
            Self::Url(reference)
        }
    }

    /// The `src` a renderer would use, if any.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::DataUri(s) | Self::Url(s) => Some(s),
            Self::NotFound => None,
        }
    }

    /// Whether the asset was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Resolves asset keys for a project.
pub trait AssetResolver: Send + Sync {
    /// Resolve `key` in the context of `project`.
    fn resolve(&self, project: &ProjectId, key: &str) -> ResolvedAsset;
}

/// Resolver that knows no assets. Inline data URIs still resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn resolve(&self, _project: &ProjectId, key: &str) -> ResolvedAsset {
        if is_data_uri(key) {
            ResolvedAsset::DataUri(key.to_string())
        } else {
            ResolvedAsset::NotFound
        }
    }
}

/// Resolver backed by a bundle's asset table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleAssets {
    assets: BTreeMap<String, String>,
}

impl BundleAssets {
    /// Wrap an asset table of key to data URI or path.
    #[must_use]
    pub fn new(assets: BTreeMap<String, String>) -> Self {
        Self { assets }
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetResolver for BundleAssets {
    fn resolve(&self, _project: &ProjectId, key: &str) -> ResolvedAsset {
        match self.assets.get(key) {
            Some(reference) => ResolvedAsset::from_reference(reference.as_str()),
            None if is_data_uri(key) => ResolvedAsset::DataUri(key.to_string()),
            None => ResolvedAsset::NotFound,
        }
    }
}

/// Resolver that reads `<root>/<project>/<key>` and embeds the file.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    /// Create a resolver rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for `key`, or `None` if it would escape the project directory.
    #[must_use]
    pub fn asset_path(&self, project: &ProjectId, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return None;
        }
        Some(
            self.root
                .join(encode_file_name(project.as_str()))
                .join(relative),
        )
    }
}

impl AssetResolver for DirectoryAssets {
    fn resolve(&self, project: &ProjectId, key: &str) -> ResolvedAsset {
        if is_data_uri(key) {
            return ResolvedAsset::DataUri(key.to_string());
        }
        let Some(path) = self.asset_path(project, key) else {
            tracing::warn!("Rejected asset key outside project directory: {key}");
            return ResolvedAsset::NotFound;
        };
        match std::fs::read(&path) {
            Ok(bytes) => ResolvedAsset::DataUri(encode_data_uri(mime_for_path(&path), &bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Asset {key} not found at {}", path.display());
                ResolvedAsset::NotFound
            }
            Err(e) => {
                tracing::warn!("Failed to read asset {}: {e}", path.display());
                ResolvedAsset::NotFound
            }
        }
    }
}

/// Whether `value` is a `data:` URI.
#[must_use]
pub fn is_data_uri(value: &str) -> bool {
    value.starts_with("data:")
}

/// Build a base64 data URI.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// MIME type guessed from a file extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
