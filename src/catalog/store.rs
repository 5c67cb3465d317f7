//! # Metadata Catalog Contract
//!
//! Every call is one transaction: atomic, and serializable against every
//! other call on the same catalog. Quota arithmetic lives here so callers
//! never read a total, modify it and write it back.

use serde::Serialize;
use uuid::Uuid;

use super::errors::CatalogResult;
use crate::model::{
    AccountTier, BucketBinding, FileQuery, FileRecord, Folder, OwnerId, ShareLink, StorageUsage,
};

/// Result of committing an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Record inserted and usage incremented in the same transaction
    Inserted {
        record: FileRecord,
        usage: StorageUsage,
    },
    /// The object key was already committed; nothing changed
    AlreadyCommitted(FileRecord),
}

impl CommitOutcome {
    pub fn record(&self) -> &FileRecord {
        match self {
            CommitOutcome::Inserted { record, .. } => record,
            CommitOutcome::AlreadyCommitted(record) => record,
        }
    }

    pub fn into_record(self) -> FileRecord {
        match self {
            CommitOutcome::Inserted { record, .. } => record,
            CommitOutcome::AlreadyCommitted(record) => record,
        }
    }
}

/// Usage before and after a recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub owner_id: OwnerId,
    pub previous: u64,
    pub current: u64,
}

impl Reconciliation {
    pub fn drifted(&self) -> bool {
        self.previous != self.current
    }
}

/// Transactional metadata storage
pub trait MetadataCatalog: Send + Sync + std::fmt::Debug {
    // Bucket bindings

    fn get_binding(&self, owner_id: &OwnerId) -> CatalogResult<Option<BucketBinding>>;

    /// Insert a binding; if one exists already, return it unchanged
    fn insert_binding(&self, binding: BucketBinding) -> CatalogResult<BucketBinding>;

    // Tiers

    fn tier(&self, owner_id: &OwnerId) -> CatalogResult<AccountTier>;

    fn set_tier(&self, owner_id: &OwnerId, tier: AccountTier) -> CatalogResult<()>;

    // Files

    fn get_file(&self, file_id: &Uuid) -> CatalogResult<Option<FileRecord>>;

    fn get_file_by_key(&self, object_key: &str) -> CatalogResult<Option<FileRecord>>;

    /// Filtered and sorted listing of one owner's files
    fn list_files(&self, owner_id: &OwnerId, query: &FileQuery) -> CatalogResult<Vec<FileRecord>>;

    /// Replace an existing record (rename, move)
    fn update_file(&self, record: FileRecord) -> CatalogResult<FileRecord>;

    /// Insert a record and increment its owner's usage by `size_bytes`
    fn commit_upload(&self, record: FileRecord) -> CatalogResult<CommitOutcome>;

    /// Delete a record, tombstone its shares and recompute usage
    fn delete_file(&self, owner_id: &OwnerId, file_id: &Uuid) -> CatalogResult<StorageUsage>;

    // Usage

    fn usage(&self, owner_id: &OwnerId) -> CatalogResult<StorageUsage>;

    /// Sum of `size_bytes` over an owner's records
    fn sum_file_sizes(&self, owner_id: &OwnerId) -> CatalogResult<u64>;

    /// Overwrite usage with `sum_file_sizes` in one transaction
    fn reconcile_usage(&self, owner_id: &OwnerId) -> CatalogResult<Reconciliation>;

    /// Every owner with a binding, usage row or file
    fn owners(&self) -> CatalogResult<Vec<OwnerId>>;

    // Shares

    /// Insert a share for an existing file; `Conflict` if the token is
    /// already taken
    fn insert_share(&self, share: ShareLink) -> CatalogResult<ShareLink>;

    fn get_share(&self, share_id: &Uuid) -> CatalogResult<Option<ShareLink>>;

    fn get_share_by_token(&self, token: &str) -> CatalogResult<Option<ShareLink>>;

    /// Replace a share. A revoked share cannot be un-revoked (`Conflict`).
    fn update_share(&self, share: ShareLink) -> CatalogResult<ShareLink>;

    /// An owner's shares, newest first
    fn list_shares(&self, owner_id: &OwnerId) -> CatalogResult<Vec<ShareLink>>;

    // Folders

    fn insert_folder(&self, folder: Folder) -> CatalogResult<Folder>;

    fn get_folder(&self, folder_id: &Uuid) -> CatalogResult<Option<Folder>>;

    fn update_folder(&self, folder: Folder) -> CatalogResult<Folder>;

    /// Delete a folder; its files move to the root and its children move
    /// up to its parent
    fn delete_folder(&self, owner_id: &OwnerId, folder_id: &Uuid) -> CatalogResult<()>;

    /// An owner's folders sorted by name
    fn list_folders(&self, owner_id: &OwnerId) -> CatalogResult<Vec<Folder>>;
}
