//! Shared fixtures for vault scenario tests

#![allow(dead_code)]

use std::sync::Arc;

use cloudvault::blob::MemoryBlobStore;
use cloudvault::catalog::LocalCatalog;
use cloudvault::config::VaultConfig;
use cloudvault::model::{FileRecord, OwnerId, TierLimits};
use cloudvault::retry::RetryPolicy;
use cloudvault::transfer::ConfirmUpload;
use cloudvault::VaultService;

pub const MB: u64 = 1024 * 1024;

pub type TestService = VaultService<MemoryBlobStore, LocalCatalog>;

pub struct Fixture {
    pub service: TestService,
    pub blob: Arc<MemoryBlobStore>,
    pub catalog: Arc<LocalCatalog>,
}

/// Free tier: 100 MB quota, 80 MB per file. Retries never sleep.
pub fn test_config() -> VaultConfig {
    let mut config = VaultConfig::new("/tmp/cloudvault-tests", "s".repeat(32), "j".repeat(32));
    config.tiers.free = TierLimits {
        quota_bytes: 100 * MB,
        max_file_bytes: 80 * MB,
    };
    config.retry = RetryPolicy::immediate(4);
    config
}

pub fn fixture() -> Fixture {
    fixture_with(test_config())
}

pub fn fixture_with(config: VaultConfig) -> Fixture {
    let blob = Arc::new(MemoryBlobStore::new());
    let catalog = Arc::new(LocalCatalog::in_memory());
    let service = VaultService::new(config, Arc::clone(&blob), Arc::clone(&catalog));
    Fixture {
        service,
        blob,
        catalog,
    }
}

impl Fixture {
    /// Request, write the object directly, confirm
    pub fn upload(&self, owner: &OwnerId, name: &str, size: u64) -> FileRecord {
        let ticket = self
            .service
            .transfers()
            .request_upload(owner, name, "application/octet-stream", size, None)
            .expect("request_upload");
        self.blob
            .put_sized(&ticket.capability.namespace, &ticket.object_key, size)
            .expect("direct put");
        self.service
            .transfers()
            .confirm_upload(owner, confirm_for(&ticket.object_key, name, size))
            .expect("confirm_upload")
    }
}

pub fn confirm_for(object_key: &str, name: &str, size: u64) -> ConfirmUpload {
    ConfirmUpload {
        object_key: object_key.to_string(),
        actual_size: size,
        file_name: name.to_string(),
        content_type: "application/octet-stream".to_string(),
        folder_id: None,
    }
}
