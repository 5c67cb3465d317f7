//! # Vault Errors
//!
//! The closed error taxonomy returned by every service-facing operation.
//! Callers branch on the variant; `kind()` is the stable wire name.

use thiserror::Error;

use crate::blob::BlobError;
use crate::catalog::CatalogError;

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Vault operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    // ==================
    // Admission
    // ==================
    /// Declared size does not fit in the owner's remaining quota
    #[error("Quota exceeded: requested {requested} bytes, {remaining} remaining")]
    QuotaExceeded { requested: u64, remaining: u64 },

    /// Declared size exceeds the per-file cap of the owner's tier
    #[error("File too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==================
    // Transfer
    // ==================
    /// Namespace could not be created after bounded retries
    #[error("Namespace provisioning failed: {0}")]
    ProvisioningFailed(String),

    /// Confirm called for a key with no object behind it
    #[error("Upload not found: {0}")]
    UploadNotFound(String),

    #[error("Storage backend unavailable: {0}")]
    StorageBackendUnavailable(String),

    /// The blob may exist without a record; needs reconciliation
    #[error("Metadata write failed for {object_key}: {reason}")]
    MetadataWriteFailed { object_key: String, reason: String },

    // ==================
    // Sharing
    // ==================
    #[error("Share link expired")]
    ShareExpired,

    #[error("Share link revoked")]
    ShareRevoked,

    #[error("Share link not found")]
    ShareNotFound,

    // ==================
    // Lookup / access
    // ==================
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            VaultError::InvalidInput(_) => 400,
            VaultError::Unauthorized => 401,
            VaultError::Forbidden => 403,
            VaultError::UploadNotFound(_)
            | VaultError::ShareNotFound
            | VaultError::FileNotFound(_)
            | VaultError::FolderNotFound(_) => 404,
            VaultError::ShareExpired | VaultError::ShareRevoked => 410,
            VaultError::FileTooLarge { .. } => 413,
            VaultError::QuotaExceeded { .. } => 507,
            VaultError::ProvisioningFailed(_) | VaultError::StorageBackendUnavailable(_) => 503,
            VaultError::MetadataWriteFailed { .. } | VaultError::Internal(_) => 500,
        }
    }

    /// Stable snake_case name used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            VaultError::QuotaExceeded { .. } => "quota_exceeded",
            VaultError::FileTooLarge { .. } => "file_too_large",
            VaultError::InvalidInput(_) => "invalid_input",
            VaultError::ProvisioningFailed(_) => "provisioning_failed",
            VaultError::UploadNotFound(_) => "upload_not_found",
            VaultError::StorageBackendUnavailable(_) => "storage_backend_unavailable",
            VaultError::MetadataWriteFailed { .. } => "metadata_write_failed",
            VaultError::ShareExpired => "share_expired",
            VaultError::ShareRevoked => "share_revoked",
            VaultError::ShareNotFound => "share_not_found",
            VaultError::FileNotFound(_) => "file_not_found",
            VaultError::FolderNotFound(_) => "folder_not_found",
            VaultError::Forbidden => "forbidden",
            VaultError::Unauthorized => "unauthorized",
            VaultError::Internal(_) => "internal",
        }
    }

    /// Transient errors the caller may retry with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VaultError::ProvisioningFailed(_) | VaultError::StorageBackendUnavailable(_)
        )
    }
}

impl From<BlobError> for VaultError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::Unavailable(msg) => VaultError::StorageBackendUnavailable(msg),
            BlobError::ObjectNotFound(key) => VaultError::UploadNotFound(key),
            other => VaultError::Internal(other.to_string()),
        }
    }
}

/// Catalog failures on read paths. Write paths that follow a blob write map
/// explicitly to `MetadataWriteFailed` so the orphan is reported.
impl From<CatalogError> for VaultError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::FileNotFound(id) => VaultError::FileNotFound(id),
            CatalogError::FolderNotFound(id) => VaultError::FolderNotFound(id),
            CatalogError::ShareNotFound(_) => VaultError::ShareNotFound,
            other => VaultError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(VaultError::QuotaExceeded { requested: 10, remaining: 5 }.status_code(), 507);
        assert_eq!(VaultError::FileTooLarge { size: 10, max: 5 }.status_code(), 413);
        assert_eq!(VaultError::ShareRevoked.status_code(), 410);
        assert_eq!(VaultError::ShareNotFound.status_code(), 404);
        assert_eq!(VaultError::Forbidden.status_code(), 403);
        assert_eq!(VaultError::StorageBackendUnavailable("down".into()).status_code(), 503);
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(VaultError::ProvisioningFailed("x".into()).is_retryable());
        assert!(VaultError::StorageBackendUnavailable("x".into()).is_retryable());
        assert!(!VaultError::UploadNotFound("k".into()).is_retryable());
        assert!(!VaultError::MetadataWriteFailed {
            object_key: "k".into(),
            reason: "disk".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_blob_error_mapping() {
        let err: VaultError = BlobError::Unavailable("timeout".into()).into();
        assert_eq!(err, VaultError::StorageBackendUnavailable("timeout".into()));
    }

    #[test]
    fn test_kind_is_snake_case() {
        assert_eq!(VaultError::ShareExpired.kind(), "share_expired");
        assert_eq!(
            VaultError::MetadataWriteFailed { object_key: "k".into(), reason: "r".into() }.kind(),
            "metadata_write_failed"
        );
    }
}
