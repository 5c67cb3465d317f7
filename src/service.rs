//! # Vault Service
//!
//! Explicitly constructed service object. Configuration and both backends
//! are injected; every component shares the same catalog, blob store and
//! metrics registry.

use std::fs;
use std::sync::Arc;

use serde::Serialize;

use crate::blob::{BlobStore, LocalBlobStore};
use crate::catalog::{LocalCatalog, MetadataCatalog};
use crate::config::VaultConfig;
use crate::errors::{VaultError, VaultResult};
use crate::library::FileLibrary;
use crate::maintenance::UsageReconciler;
use crate::model::ShareLink;
use crate::observability::MetricsRegistry;
use crate::sharing::{ResolvedShare, ShareLinkIssuer};
use crate::transfer::{DownloadTicket, TransferCoordinator};

/// Service over type-erased backends, as held by the HTTP layer
pub type DynVaultService = VaultService<dyn BlobStore, dyn MetadataCatalog>;

/// A resolved share: the link and a short-lived download capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedDownload {
    pub share: ShareLink,
    pub download: DownloadTicket,
}

#[derive(Debug)]
pub struct VaultService<B: ?Sized, C: ?Sized> {
    config: VaultConfig,
    blob: Arc<B>,
    catalog: Arc<C>,
    metrics: Arc<MetricsRegistry>,
    transfers: TransferCoordinator<B, C>,
    shares: ShareLinkIssuer<C>,
    library: FileLibrary<C>,
    reconciler: UsageReconciler<B, C>,
}

impl<B, C> VaultService<B, C>
where
    B: BlobStore + ?Sized,
    C: MetadataCatalog + ?Sized,
{
    pub fn new(config: VaultConfig, blob: Arc<B>, catalog: Arc<C>) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());

        let transfers = TransferCoordinator::new(
            Arc::clone(&blob),
            Arc::clone(&catalog),
            config.tiers,
            config.transfer,
            config.retry,
            Arc::clone(&metrics),
        );
        let shares = ShareLinkIssuer::new(Arc::clone(&catalog), Arc::clone(&metrics));
        let library = FileLibrary::new(Arc::clone(&catalog), config.tiers);
        let reconciler = UsageReconciler::new(
            Arc::clone(&blob),
            Arc::clone(&catalog),
            config.retry,
            Arc::clone(&metrics),
        );

        Self {
            config,
            blob,
            catalog,
            metrics,
            transfers,
            shares,
            library,
            reconciler,
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn blob(&self) -> &Arc<B> {
        &self.blob
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn transfers(&self) -> &TransferCoordinator<B, C> {
        &self.transfers
    }

    pub fn shares(&self) -> &ShareLinkIssuer<C> {
        &self.shares
    }

    pub fn library(&self) -> &FileLibrary<C> {
        &self.library
    }

    pub fn reconciler(&self) -> &UsageReconciler<B, C> {
        &self.reconciler
    }

    /// Anonymous share resolution: validate the token, then issue a
    /// download capability for the shared file
    pub fn resolve_share(&self, token: &str) -> VaultResult<SharedDownload> {
        let ResolvedShare { share, file } = self.shares.validate_share(token)?;
        let download = self.transfers.request_shared_download(&share, file)?;
        Ok(SharedDownload { share, download })
    }
}

/// Backends for a single-node deployment under `config.data_dir`
pub fn open_local(config: &VaultConfig) -> VaultResult<(Arc<LocalBlobStore>, Arc<LocalCatalog>)> {
    let blob_root = config.blob_root();
    fs::create_dir_all(&blob_root).map_err(|e| {
        VaultError::Internal(format!("failed to create {}: {}", blob_root.display(), e))
    })?;

    let blob = LocalBlobStore::new(
        blob_root,
        config.public_base_url.trim_end_matches('/'),
        config.signing_secret.as_bytes(),
    );
    let catalog = LocalCatalog::open(config.catalog_path())?;
    Ok((Arc::new(blob), Arc::new(catalog)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::model::ExpirationPolicy;
    use crate::transfer::ConfirmUpload;
    use uuid::Uuid;

    fn service() -> (VaultService<MemoryBlobStore, LocalCatalog>, Arc<MemoryBlobStore>) {
        let blob = Arc::new(MemoryBlobStore::new());
        let mut config = VaultConfig::new("/tmp/unused", "s".repeat(32), "j".repeat(32));
        config.retry = crate::retry::RetryPolicy::immediate(2);
        let service = VaultService::new(config, Arc::clone(&blob), Arc::new(LocalCatalog::in_memory()));
        (service, blob)
    }

    #[test]
    fn test_upload_share_resolve() {
        let (service, blob) = service();
        let owner = Uuid::new_v4();

        let ticket = service
            .transfers()
            .request_upload(&owner, "notes.txt", "text/plain", 5, None)
            .unwrap();
        blob.put_object(&ticket.capability.namespace, &ticket.object_key, b"hello").unwrap();
        let file = service
            .transfers()
            .confirm_upload(
                &owner,
                ConfirmUpload {
                    object_key: ticket.object_key.clone(),
                    actual_size: 5,
                    file_name: "notes.txt".into(),
                    content_type: "text/plain".into(),
                    folder_id: None,
                },
            )
            .unwrap();

        let share = service.shares().create_share(&owner, &file.id, ExpirationPolicy::OneDay).unwrap();
        let resolved = service.resolve_share(&share.token).unwrap();
        assert_eq!(resolved.share.id, share.id);
        assert_eq!(resolved.download.file.id, file.id);

        let snapshot = service.metrics().snapshot();
        assert_eq!(snapshot.shares_resolved, 1);
        assert_eq!(snapshot.downloads_issued, 1);
    }

    #[test]
    fn test_resolve_unknown_token() {
        let (service, _) = service();
        assert_eq!(service.resolve_share("missing"), Err(VaultError::ShareNotFound));
    }

    #[test]
    fn test_open_local_creates_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = VaultConfig::new(
            dir.path().to_string_lossy().to_string(),
            "s".repeat(32),
            "j".repeat(32),
        );
        let (blob, catalog) = open_local(&config).unwrap();
        assert!(blob.root().is_dir());

        let blob: Arc<dyn BlobStore> = blob;
        let catalog: Arc<dyn MetadataCatalog> = catalog;
        let service: DynVaultService = VaultService::new(config, blob, catalog);
        assert!(service.catalog().owners().unwrap().is_empty());
    }
}
