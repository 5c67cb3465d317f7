//! # Catalog Errors

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Metadata catalog errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Share not found: {0}")]
    ShareNotFound(String),

    /// Unique constraint violated (object key, share token)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The transaction was rolled back because it could not be persisted
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Catalog file is corrupt: {0}")]
    Corrupt(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Whether the failure happened while committing a write
    pub fn is_write_failure(&self) -> bool {
        matches!(self, CatalogError::WriteFailed(_) | CatalogError::Internal(_))
    }
}
