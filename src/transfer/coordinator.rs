//! # Transfer Coordinator
//!
//! Two-phase uploads: `request_upload` admits the transfer and issues a PUT
//! capability, the caller writes the object directly, and `confirm_upload`
//! reads the stored object's size, rechecks it against the file cap and
//! remaining quota, and commits the record and quota in one catalog
//! transaction. The committed size is always the backend's, never the
//! caller's report. A caller that never confirms leaves an orphaned object and
//! consumes no quota.
//!
//! Capability issuance touches no shared counters. The only shared mutable
//! value, an owner's usage total, is changed exclusively inside catalog
//! transactions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blob::{BlobStore, Capability};
use crate::catalog::{CatalogError, CommitOutcome, MetadataCatalog};
use crate::config::{TierConfig, TransferConfig};
use crate::errors::{VaultError, VaultResult};
use crate::model::{
    derive_object_key, key_belongs_to, validate_content_type, validate_display_name, FileRecord,
    OwnerId, ShareLink, ShareState, StorageUsage,
};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::retry::RetryPolicy;

use super::provisioner::BucketProvisioner;
use super::with_backend_retry;

/// Issued by `request_upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadTicket {
    pub capability: Capability,
    pub object_key: String,
    pub expires_at: DateTime<Utc>,
}

/// What the caller reports after a direct upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmUpload {
    pub object_key: String,
    pub actual_size: u64,
    pub file_name: String,
    pub content_type: String,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

/// Issued by `request_download` and share resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTicket {
    pub capability: Capability,
    pub expires_at: DateTime<Utc>,
    pub file: FileRecord,
}

#[derive(Debug)]
pub struct TransferCoordinator<B: ?Sized, C: ?Sized> {
    blob: Arc<B>,
    catalog: Arc<C>,
    provisioner: BucketProvisioner<B, C>,
    tiers: TierConfig,
    transfer: TransferConfig,
    retry: RetryPolicy,
    metrics: Arc<MetricsRegistry>,
}

impl<B, C> TransferCoordinator<B, C>
where
    B: BlobStore + ?Sized,
    C: MetadataCatalog + ?Sized,
{
    pub fn new(
        blob: Arc<B>,
        catalog: Arc<C>,
        tiers: TierConfig,
        transfer: TransferConfig,
        retry: RetryPolicy,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let provisioner = BucketProvisioner::new(
            Arc::clone(&blob),
            Arc::clone(&catalog),
            retry,
            Arc::clone(&metrics),
        );
        Self {
            blob,
            catalog,
            provisioner,
            tiers,
            transfer,
            retry,
            metrics,
        }
    }

    pub fn provisioner(&self) -> &BucketProvisioner<B, C> {
        &self.provisioner
    }

    /// Admit an upload and issue a PUT capability.
    ///
    /// Validation, size cap, quota and folder checks all run before any
    /// backend call; a rejected request never provisions a namespace.
    pub fn request_upload(
        &self,
        owner_id: &OwnerId,
        file_name: &str,
        content_type: &str,
        declared_size: u64,
        folder_id: Option<Uuid>,
    ) -> VaultResult<UploadTicket> {
        self.metrics.increment_uploads_requested();

        let admitted = self.admit(owner_id, file_name, content_type, declared_size, folder_id);
        let (name, content_type) = match admitted {
            Ok(v) => v,
            Err(e) => return Err(self.reject(owner_id, declared_size, e)),
        };

        let namespace = self.provisioner.ensure_namespace(owner_id)?;
        let object_key = derive_object_key(owner_id, &name);
        let ttl = self.transfer.upload_ttl();

        let capability = with_backend_retry(&self.retry, &self.metrics, "issue_upload", || {
            self.blob
                .issue_upload_capability(&namespace, &object_key, &content_type, ttl)
        })?;

        log_event_with_fields(
            Event::UploadRequested,
            &[
                ("owner_id", &owner_id.to_string()),
                ("object_key", &object_key),
                ("declared_size", &declared_size.to_string()),
            ],
        );

        Ok(UploadTicket {
            expires_at: capability.expires_at,
            capability,
            object_key,
        })
    }

    fn admit(
        &self,
        owner_id: &OwnerId,
        file_name: &str,
        content_type: &str,
        declared_size: u64,
        folder_id: Option<Uuid>,
    ) -> VaultResult<(String, String)> {
        let name = validate_display_name(file_name)?;
        let content_type = validate_content_type(content_type)?;

        let limits = self.tiers.limits_for(self.catalog.tier(owner_id)?);
        if declared_size > limits.max_file_bytes {
            return Err(VaultError::FileTooLarge {
                size: declared_size,
                max: limits.max_file_bytes,
            });
        }

        let used = self.catalog.usage(owner_id)?.total_bytes;
        let remaining = limits.remaining(used);
        if declared_size > remaining {
            return Err(VaultError::QuotaExceeded {
                requested: declared_size,
                remaining,
            });
        }

        if let Some(folder_id) = folder_id {
            match self.catalog.get_folder(&folder_id)? {
                Some(folder) if &folder.owner_id == owner_id => {}
                _ => return Err(VaultError::FolderNotFound(folder_id.to_string())),
            }
        }

        Ok((name, content_type))
    }

    fn reject(&self, owner_id: &OwnerId, declared_size: u64, err: VaultError) -> VaultError {
        self.metrics.increment_uploads_rejected();
        log_event_with_fields(
            Event::UploadRejected,
            &[
                ("owner_id", &owner_id.to_string()),
                ("declared_size", &declared_size.to_string()),
                ("kind", err.kind()),
            ],
        );
        err
    }

    /// Commit an upload once its object is confirmed present.
    ///
    /// Confirming an already committed key returns the existing record and
    /// does not count it twice.
    pub fn confirm_upload(&self, owner_id: &OwnerId, confirm: ConfirmUpload) -> VaultResult<FileRecord> {
        let object_key = confirm.object_key;
        if !key_belongs_to(owner_id, &object_key) {
            return Err(VaultError::Forbidden);
        }

        if let Some(existing) = self.catalog.get_file_by_key(&object_key)? {
            return Ok(existing);
        }

        let name = validate_display_name(&confirm.file_name)?;
        let content_type = validate_content_type(&confirm.content_type)?;

        let namespace = match self.catalog.get_binding(owner_id)? {
            Some(binding) => binding.namespace,
            None => return Err(VaultError::UploadNotFound(object_key)),
        };

        let stored_size = match with_backend_retry(&self.retry, &self.metrics, "object_size", || {
            self.blob.object_size(&namespace, &object_key)
        })? {
            Some(size) => size,
            None => return Err(VaultError::UploadNotFound(object_key)),
        };
        self.check_stored_size(owner_id, confirm.actual_size, stored_size)
            .map_err(|e| self.reject(owner_id, stored_size, e))?;

        // A folder removed since the request puts the file at the root
        let folder_id = match confirm.folder_id {
            Some(id) => self
                .catalog
                .get_folder(&id)?
                .filter(|f| &f.owner_id == owner_id)
                .map(|f| f.id),
            None => None,
        };

        let record = FileRecord::new(
            *owner_id,
            name,
            stored_size,
            content_type,
            object_key.clone(),
            folder_id,
        );

        match self.catalog.commit_upload(record) {
            Ok(CommitOutcome::Inserted { record, usage }) => {
                self.metrics.record_upload_confirmed(record.size_bytes);
                log_event_with_fields(
                    Event::UploadConfirmed,
                    &[
                        ("owner_id", &owner_id.to_string()),
                        ("object_key", &record.object_key),
                        ("size_bytes", &record.size_bytes.to_string()),
                        ("total_bytes", &usage.total_bytes.to_string()),
                    ],
                );
                Ok(record)
            }
            Ok(CommitOutcome::AlreadyCommitted(record)) => Ok(record),
            Err(e) => Err(self.metadata_write_failed(owner_id, object_key, e)),
        }
    }

    /// The declared size was only a precondition. The committed size is
    /// the one the backend reports, and it must match the caller's report
    /// and still fit the tier.
    fn check_stored_size(&self, owner_id: &OwnerId, reported: u64, stored: u64) -> VaultResult<()> {
        if reported != stored {
            return Err(VaultError::InvalidInput(format!(
                "reported size {} does not match stored object size {}",
                reported, stored
            )));
        }

        let limits = self.tiers.limits_for(self.catalog.tier(owner_id)?);
        if stored > limits.max_file_bytes {
            return Err(VaultError::FileTooLarge {
                size: stored,
                max: limits.max_file_bytes,
            });
        }

        let remaining = limits.remaining(self.catalog.usage(owner_id)?.total_bytes);
        if stored > remaining {
            return Err(VaultError::QuotaExceeded {
                requested: stored,
                remaining,
            });
        }
        Ok(())
    }

    fn metadata_write_failed(
        &self,
        owner_id: &OwnerId,
        object_key: String,
        err: CatalogError,
    ) -> VaultError {
        self.metrics.increment_metadata_write_failures();
        let reason = err.to_string();
        log_event_with_fields(
            Event::MetadataWriteFailed,
            &[
                ("owner_id", &owner_id.to_string()),
                ("object_key", &object_key),
                ("reason", &reason),
            ],
        );
        VaultError::MetadataWriteFailed { object_key, reason }
    }

    /// Issue a GET capability for one of the owner's files
    pub fn request_download(&self, owner_id: &OwnerId, file_id: &Uuid) -> VaultResult<DownloadTicket> {
        let file = self.owned_file(owner_id, file_id)?;
        self.issue_download(file)
    }

    /// Issue a GET capability for the file behind a resolved share link
    pub fn request_shared_download(&self, share: &ShareLink, file: FileRecord) -> VaultResult<DownloadTicket> {
        match share.state(Utc::now()) {
            ShareState::Active => {}
            ShareState::Expired => return Err(VaultError::ShareExpired),
            ShareState::Revoked => return Err(VaultError::ShareRevoked),
        }
        if file.id != share.file_id {
            return Err(VaultError::Forbidden);
        }
        self.issue_download(file)
    }

    fn issue_download(&self, file: FileRecord) -> VaultResult<DownloadTicket> {
        let namespace = self
            .catalog
            .get_binding(&file.owner_id)?
            .map(|b| b.namespace)
            .ok_or_else(|| VaultError::Internal(format!("no namespace bound for {}", file.owner_id)))?;
        let ttl = self.transfer.download_ttl();

        let capability = with_backend_retry(&self.retry, &self.metrics, "issue_download", || {
            self.blob
                .issue_download_capability(&namespace, &file.object_key, ttl)
        })?;

        self.metrics.increment_downloads_issued();
        log_event_with_fields(
            Event::DownloadIssued,
            &[
                ("owner_id", &file.owner_id.to_string()),
                ("file_id", &file.id.to_string()),
            ],
        );

        Ok(DownloadTicket {
            expires_at: capability.expires_at,
            capability,
            file,
        })
    }

    /// Delete the backing object, then the record.
    ///
    /// If the object delete fails the record stays and the error surfaces.
    /// If the catalog delete fails afterwards the call reports
    /// `MetadataWriteFailed` and is safe to repeat.
    pub fn delete_file(&self, owner_id: &OwnerId, file_id: &Uuid) -> VaultResult<StorageUsage> {
        let file = self.owned_file(owner_id, file_id)?;
        let namespace = self
            .catalog
            .get_binding(owner_id)?
            .map(|b| b.namespace)
            .ok_or_else(|| VaultError::Internal(format!("no namespace bound for {}", owner_id)))?;

        with_backend_retry(&self.retry, &self.metrics, "delete_object", || {
            self.blob.delete_object(&namespace, &file.object_key)
        })?;

        let usage = match self.catalog.delete_file(owner_id, file_id) {
            Ok(usage) => usage,
            Err(CatalogError::FileNotFound(id)) => return Err(VaultError::FileNotFound(id)),
            Err(e) => return Err(self.metadata_write_failed(owner_id, file.object_key, e)),
        };

        self.metrics.increment_files_deleted();
        log_event_with_fields(
            Event::FileDeleted,
            &[
                ("owner_id", &owner_id.to_string()),
                ("object_key", &file.object_key),
                ("total_bytes", &usage.total_bytes.to_string()),
            ],
        );

        Ok(usage)
    }

    fn owned_file(&self, owner_id: &OwnerId, file_id: &Uuid) -> VaultResult<FileRecord> {
        let file = self
            .catalog
            .get_file(file_id)?
            .ok_or_else(|| VaultError::FileNotFound(file_id.to_string()))?;
        if &file.owner_id != owner_id {
            return Err(VaultError::Forbidden);
        }
        Ok(file)
    }
}
