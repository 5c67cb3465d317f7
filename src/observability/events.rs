//! Observable events
//!
//! Every log line carries one of these as its `event` field.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    ConfigLoaded,
    ServerStart,

    // Transfers
    UploadRequested,
    UploadRejected,
    UploadConfirmed,
    DownloadIssued,
    FileDeleted,
    /// Catalog commit failed after the object was written or removed
    MetadataWriteFailed,

    // Provisioning
    NamespaceProvisioned,
    ProvisioningFailed,
    BackendRetry,

    // Sharing
    ShareCreated,
    ShareResolved,
    ShareRejected,
    ShareExtended,
    ShareRevoked,

    // Maintenance
    UsageReconciled,
    UsageDriftCorrected,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerStart => "SERVER_START",
            Event::UploadRequested => "UPLOAD_REQUESTED",
            Event::UploadRejected => "UPLOAD_REJECTED",
            Event::UploadConfirmed => "UPLOAD_CONFIRMED",
            Event::DownloadIssued => "DOWNLOAD_ISSUED",
            Event::FileDeleted => "FILE_DELETED",
            Event::MetadataWriteFailed => "METADATA_WRITE_FAILED",
            Event::NamespaceProvisioned => "NAMESPACE_PROVISIONED",
            Event::ProvisioningFailed => "PROVISIONING_FAILED",
            Event::BackendRetry => "BACKEND_RETRY",
            Event::ShareCreated => "SHARE_CREATED",
            Event::ShareResolved => "SHARE_RESOLVED",
            Event::ShareRejected => "SHARE_REJECTED",
            Event::ShareExtended => "SHARE_EXTENDED",
            Event::ShareRevoked => "SHARE_REVOKED",
            Event::UsageReconciled => "USAGE_RECONCILED",
            Event::UsageDriftCorrected => "USAGE_DRIFT_CORRECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::MetadataWriteFailed | Event::ProvisioningFailed => Severity::Error,
            Event::UploadRejected
            | Event::BackendRetry
            | Event::ShareRejected
            | Event::UsageDriftCorrected => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
