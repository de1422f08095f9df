//! Error types for document operations.

use thiserror::Error;

/// Result type for document operations.
pub type FolioResult<T> = Result<T, FolioError>;

/// Errors that can occur while loading, editing or navigating documents.
#[derive(Debug, Error)]
pub enum FolioError {
    /// A JSON document is missing a required field, has a wrong type or an
    /// unparsable date.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A canvas item carries a widget tag this build does not know.
    #[error("Unknown widget type: {0}")]
    UnknownWidgetType(String),

    /// An asset could not be resolved or decoded.
    #[error("Failed to resolve asset: {0}")]
    AssetResolution(String),

    /// A project lists a page id with no backing page.
    #[error("Project {project} references missing page {page}")]
    DanglingPageReference {
        /// Project that holds the reference.
        project: String,
        /// Page id that did not resolve.
        page: String,
    },

    /// The external project store failed.
    #[error("Store I/O failure: {0}")]
    StoreIo(#[from] std::io::Error),

    /// Project not found in the store.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Page not found in the store.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Canvas item not found on a page.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// An editing operation violated a model invariant.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Navigation was attempted before a project was opened.
    #[error("No project loaded")]
    NoProjectLoaded,
}

impl FolioError {
    /// Whether the caller can keep going on its last good state.
    ///
    /// Asset failures and dangling page references never abort a view;
    /// codec and store errors abort only the operation that raised them.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AssetResolution(_) | Self::DanglingPageReference { .. }
        )
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedDocument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(FolioError::AssetResolution("logo.png".into()).is_recoverable());
        assert!(FolioError::DanglingPageReference {
            project: "p".into(),
            page: "missing".into(),
        }
        .is_recoverable());
        assert!(!FolioError::MalformedDocument("x".into()).is_recoverable());
        assert!(!FolioError::UnknownWidgetType("bogus".into()).is_recoverable());
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert!(matches!(FolioError::from(err), FolioError::MalformedDocument(_)));
    }
}
