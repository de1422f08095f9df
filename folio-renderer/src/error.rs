//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering or exporting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image or other resource could not be read or decoded.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Writing an export failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Filesystem error while writing an export.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document itself was unusable.
    #[error(transparent)]
    Document(#[from] folio_core::FolioError),
}
