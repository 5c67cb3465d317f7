//! # Blob Backend Errors

use thiserror::Error;

use crate::retry::Retryable;

/// Result type for blob backend operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors reported by a blob backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    // Transient
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    // Namespace errors
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Namespace already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid namespace name: {0}")]
    InvalidNamespace(String),

    // Object errors
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    // Capability errors
    #[error("Capability expired")]
    CapabilityExpired,

    #[error("Invalid capability signature")]
    InvalidSignature,

    #[error("Content type mismatch")]
    ContentTypeMismatch,

    #[error("I/O error: {0}")]
    Io(String),
}

impl BlobError {
    /// HTTP status for the blob endpoint
    pub fn status_code(&self) -> u16 {
        match self {
            BlobError::Unavailable(_) => 503,
            BlobError::NamespaceNotFound(_) => 404,
            BlobError::AlreadyExists(_) => 409,
            BlobError::InvalidNamespace(_) => 400,
            BlobError::ObjectNotFound(_) => 404,
            BlobError::InvalidKey(_) => 400,
            BlobError::CapabilityExpired => 403,
            BlobError::InvalidSignature => 403,
            BlobError::ContentTypeMismatch => 403,
            BlobError::Io(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BlobError::Unavailable(_) => "backend_unavailable",
            BlobError::NamespaceNotFound(_) => "namespace_not_found",
            BlobError::AlreadyExists(_) => "namespace_exists",
            BlobError::InvalidNamespace(_) => "invalid_namespace",
            BlobError::ObjectNotFound(_) => "object_not_found",
            BlobError::InvalidKey(_) => "invalid_key",
            BlobError::CapabilityExpired => "capability_expired",
            BlobError::InvalidSignature => "invalid_signature",
            BlobError::ContentTypeMismatch => "content_type_mismatch",
            BlobError::Io(_) => "io",
        }
    }
}

impl Retryable for BlobError {
    fn is_retryable(&self) -> bool {
        matches!(self, BlobError::Unavailable(_))
    }
}

impl From<std::io::Error> for BlobError {
    fn from(err: std::io::Error) -> Self {
        BlobError::Io(err.to_string())
    }
}
