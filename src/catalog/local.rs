//! # Local Catalog
//!
//! All tables live behind one mutex. A write clones the tables, applies the
//! change to the clone, persists it (when file-backed) and only then swaps
//! it in, so a failed persist leaves the previous state untouched.
//!
//! Persistence is one JSON document written with temp file, fsync and
//! rename.
//!
//! ## Scaling limit
//!
//! Every write copies all tables and, when file-backed, rewrites the whole
//! document while holding the single lock. Writes from different owners
//! therefore serialize against each other and their cost grows with the
//! total catalog size, not the size of the change. This backend targets
//! development and single-node deployments; a multi-tenant deployment
//! should put a database behind `MetadataCatalog` instead.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{CatalogError, CatalogResult};
use super::store::{CommitOutcome, MetadataCatalog, Reconciliation};
use crate::model::{
    AccountTier, BucketBinding, FileQuery, FileRecord, Folder, OwnerId, ShareLink, StorageUsage,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogTables {
    #[serde(default)]
    bindings: HashMap<OwnerId, BucketBinding>,
    #[serde(default)]
    tiers: HashMap<OwnerId, AccountTier>,
    #[serde(default)]
    files: HashMap<Uuid, FileRecord>,
    #[serde(default)]
    usage: HashMap<OwnerId, StorageUsage>,
    #[serde(default)]
    shares: HashMap<Uuid, ShareLink>,
    #[serde(default)]
    folders: HashMap<Uuid, Folder>,

    // Unique indexes, rebuilt on load
    #[serde(skip)]
    file_keys: HashMap<String, Uuid>,
    #[serde(skip)]
    share_tokens: HashMap<String, Uuid>,
}

impl CatalogTables {
    fn rebuild_indexes(&mut self) {
        self.file_keys = self
            .files
            .values()
            .map(|f| (f.object_key.clone(), f.id))
            .collect();
        self.share_tokens = self
            .shares
            .values()
            .map(|s| (s.token.clone(), s.id))
            .collect();
    }

    fn sum_sizes(&self, owner_id: &OwnerId) -> u64 {
        self.files
            .values()
            .filter(|f| &f.owner_id == owner_id)
            .map(|f| f.size_bytes)
            .fold(0u64, u64::saturating_add)
    }

    fn usage_for(&self, owner_id: &OwnerId) -> StorageUsage {
        self.usage
            .get(owner_id)
            .cloned()
            .unwrap_or_else(|| StorageUsage::empty(*owner_id))
    }

    /// Overwrite an owner's usage with the recomputed sum
    fn recompute(&mut self, owner_id: &OwnerId) -> Reconciliation {
        let previous = self.usage_for(owner_id).total_bytes;
        let current = self.sum_sizes(owner_id);
        self.usage.insert(
            *owner_id,
            StorageUsage {
                owner_id: *owner_id,
                total_bytes: current,
                updated_at: Utc::now(),
            },
        );
        Reconciliation {
            owner_id: *owner_id,
            previous,
            current,
        }
    }
}

/// Metadata catalog kept in memory, optionally mirrored to a JSON file
#[derive(Debug)]
pub struct LocalCatalog {
    path: Option<PathBuf>,
    tables: Mutex<CatalogTables>,
    pending_write_failures: AtomicU32,
}

impl LocalCatalog {
    /// Catalog with no durability (tests, ephemeral runs)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: Mutex::new(CatalogTables::default()),
            pending_write_failures: AtomicU32::new(0),
        }
    }

    /// Open a file-backed catalog, loading existing state if present
    pub fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let path = path.into();
        let mut tables = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| CatalogError::Internal(format!("failed to read catalog: {}", e)))?;
            serde_json::from_str::<CatalogTables>(&content)
                .map_err(|e| CatalogError::Corrupt(e.to_string()))?
        } else {
            CatalogTables::default()
        };
        tables.rebuild_indexes();

        Ok(Self {
            path: Some(path),
            tables: Mutex::new(tables),
            pending_write_failures: AtomicU32::new(0),
        })
    }

    /// Fail the next `count` write transactions with `WriteFailed`
    pub fn fail_next_writes(&self, count: u32) {
        self.pending_write_failures.store(count, Ordering::SeqCst);
    }

    fn lock(&self) -> CatalogResult<MutexGuard<'_, CatalogTables>> {
        self.tables
            .lock()
            .map_err(|_| CatalogError::Internal("Lock poisoned".to_string()))
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogTables) -> T) -> CatalogResult<T> {
        let tables = self.lock()?;
        Ok(f(&tables))
    }

    /// Run one write transaction
    fn transact<T>(
        &self,
        f: impl FnOnce(&mut CatalogTables) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let mut tables = self.lock()?;
        let mut next = tables.clone();
        let out = f(&mut next)?;

        let injected = self
            .pending_write_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(CatalogError::WriteFailed("injected write failure".to_string()));
        }

        if let Some(path) = &self.path {
            persist(path, &next)?;
        }

        *tables = next;
        Ok(out)
    }
}

fn write_failed(what: &str, e: impl std::fmt::Display) -> CatalogError {
    CatalogError::WriteFailed(format!("{}: {}", what, e))
}

/// Write the tables atomically: temp file, fsync, rename, fsync dir
fn persist(path: &Path, tables: &CatalogTables) -> CatalogResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_failed("failed to create catalog dir", e))?;
    }

    let content =
        serde_json::to_vec(tables).map_err(|e| write_failed("failed to serialize catalog", e))?;

    let temp_path = path.with_extension("json.tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| write_failed("failed to create temp catalog", e))?;
    file.write_all(&content)
        .map_err(|e| write_failed("failed to write catalog", e))?;
    file.sync_all()
        .map_err(|e| write_failed("failed to fsync catalog", e))?;

    fs::rename(&temp_path, path).map_err(|e| write_failed("failed to commit catalog", e))?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

impl MetadataCatalog for LocalCatalog {
    fn get_binding(&self, owner_id: &OwnerId) -> CatalogResult<Option<BucketBinding>> {
        self.read(|t| t.bindings.get(owner_id).cloned())
    }

    fn insert_binding(&self, binding: BucketBinding) -> CatalogResult<BucketBinding> {
        if let Some(existing) = self.get_binding(&binding.owner_id)? {
            return Ok(existing);
        }
        self.transact(|t| {
            let stored = t
                .bindings
                .entry(binding.owner_id)
                .or_insert(binding)
                .clone();
            Ok(stored)
        })
    }

    fn tier(&self, owner_id: &OwnerId) -> CatalogResult<AccountTier> {
        self.read(|t| t.tiers.get(owner_id).copied().unwrap_or_default())
    }

    fn set_tier(&self, owner_id: &OwnerId, tier: AccountTier) -> CatalogResult<()> {
        self.transact(|t| {
            t.tiers.insert(*owner_id, tier);
            Ok(())
        })
    }

    fn get_file(&self, file_id: &Uuid) -> CatalogResult<Option<FileRecord>> {
        self.read(|t| t.files.get(file_id).cloned())
    }

    fn get_file_by_key(&self, object_key: &str) -> CatalogResult<Option<FileRecord>> {
        self.read(|t| {
            t.file_keys
                .get(object_key)
                .and_then(|id| t.files.get(id))
                .cloned()
        })
    }

    fn list_files(&self, owner_id: &OwnerId, query: &FileQuery) -> CatalogResult<Vec<FileRecord>> {
        let mut files = self.read(|t| {
            t.files
                .values()
                .filter(|f| &f.owner_id == owner_id && query.matches(f))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        query.sort(&mut files);
        Ok(files)
    }

    fn update_file(&self, record: FileRecord) -> CatalogResult<FileRecord> {
        self.transact(|t| {
            let existing = t
                .files
                .get_mut(&record.id)
                .ok_or_else(|| CatalogError::FileNotFound(record.id.to_string()))?;
            if existing.object_key != record.object_key || existing.size_bytes != record.size_bytes {
                return Err(CatalogError::Conflict(
                    "object key and size of a committed file are immutable".to_string(),
                ));
            }
            *existing = record.clone();
            Ok(record)
        })
    }

    fn commit_upload(&self, record: FileRecord) -> CatalogResult<CommitOutcome> {
        self.transact(|t| {
            if let Some(existing) = t
                .file_keys
                .get(&record.object_key)
                .and_then(|id| t.files.get(id))
            {
                return Ok(CommitOutcome::AlreadyCommitted(existing.clone()));
            }

            let mut usage = t.usage_for(&record.owner_id);
            usage.total_bytes = usage.total_bytes.saturating_add(record.size_bytes);
            usage.updated_at = Utc::now();

            t.usage.insert(record.owner_id, usage.clone());
            t.file_keys.insert(record.object_key.clone(), record.id);
            t.files.insert(record.id, record.clone());

            Ok(CommitOutcome::Inserted { record, usage })
        })
    }

    fn delete_file(&self, owner_id: &OwnerId, file_id: &Uuid) -> CatalogResult<StorageUsage> {
        self.transact(|t| {
            let record = match t.files.get(file_id) {
                Some(r) if &r.owner_id == owner_id => r.clone(),
                _ => return Err(CatalogError::FileNotFound(file_id.to_string())),
            };

            t.files.remove(file_id);
            t.file_keys.remove(&record.object_key);
            for share in t.shares.values_mut().filter(|s| &s.file_id == file_id) {
                share.revoked = true;
            }

            t.recompute(owner_id);
            Ok(t.usage_for(owner_id))
        })
    }

    fn usage(&self, owner_id: &OwnerId) -> CatalogResult<StorageUsage> {
        self.read(|t| t.usage_for(owner_id))
    }

    fn sum_file_sizes(&self, owner_id: &OwnerId) -> CatalogResult<u64> {
        self.read(|t| t.sum_sizes(owner_id))
    }

    fn reconcile_usage(&self, owner_id: &OwnerId) -> CatalogResult<Reconciliation> {
        self.transact(|t| Ok(t.recompute(owner_id)))
    }

    fn owners(&self) -> CatalogResult<Vec<OwnerId>> {
        self.read(|t| {
            let owners: BTreeSet<OwnerId> = t
                .bindings
                .keys()
                .chain(t.usage.keys())
                .copied()
                .chain(t.files.values().map(|f| f.owner_id))
                .collect();
            owners.into_iter().collect()
        })
    }

    fn insert_share(&self, share: ShareLink) -> CatalogResult<ShareLink> {
        self.transact(|t| {
            if !t.files.contains_key(&share.file_id) {
                return Err(CatalogError::FileNotFound(share.file_id.to_string()));
            }
            if t.share_tokens.contains_key(&share.token) {
                return Err(CatalogError::Conflict("share token already in use".to_string()));
            }
            t.share_tokens.insert(share.token.clone(), share.id);
            t.shares.insert(share.id, share.clone());
            Ok(share)
        })
    }

    fn get_share(&self, share_id: &Uuid) -> CatalogResult<Option<ShareLink>> {
        self.read(|t| t.shares.get(share_id).cloned())
    }

    fn get_share_by_token(&self, token: &str) -> CatalogResult<Option<ShareLink>> {
        self.read(|t| {
            t.share_tokens
                .get(token)
                .and_then(|id| t.shares.get(id))
                .cloned()
        })
    }

    fn update_share(&self, share: ShareLink) -> CatalogResult<ShareLink> {
        self.transact(|t| {
            let existing = t
                .shares
                .get_mut(&share.id)
                .ok_or_else(|| CatalogError::ShareNotFound(share.id.to_string()))?;
            if existing.token != share.token {
                return Err(CatalogError::Conflict("share token is immutable".to_string()));
            }
            if existing.revoked && !share.revoked {
                return Err(CatalogError::Conflict("share is revoked".to_string()));
            }
            *existing = share.clone();
            Ok(share)
        })
    }

    fn list_shares(&self, owner_id: &OwnerId) -> CatalogResult<Vec<ShareLink>> {
        let mut shares = self.read(|t| {
            t.shares
                .values()
                .filter(|s| &s.owner_id == owner_id)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(shares)
    }

    fn insert_folder(&self, folder: Folder) -> CatalogResult<Folder> {
        self.transact(|t| {
            if t.folders.contains_key(&folder.id) {
                return Err(CatalogError::Conflict(format!("folder {} exists", folder.id)));
            }
            t.folders.insert(folder.id, folder.clone());
            Ok(folder)
        })
    }

    fn get_folder(&self, folder_id: &Uuid) -> CatalogResult<Option<Folder>> {
        self.read(|t| t.folders.get(folder_id).cloned())
    }

    fn update_folder(&self, folder: Folder) -> CatalogResult<Folder> {
        self.transact(|t| {
            let existing = t
                .folders
                .get_mut(&folder.id)
                .ok_or_else(|| CatalogError::FolderNotFound(folder.id.to_string()))?;
            *existing = folder.clone();
            Ok(folder)
        })
    }

    fn delete_folder(&self, owner_id: &OwnerId, folder_id: &Uuid) -> CatalogResult<()> {
        self.transact(|t| {
            let folder = match t.folders.get(folder_id) {
                Some(f) if &f.owner_id == owner_id => f.clone(),
                _ => return Err(CatalogError::FolderNotFound(folder_id.to_string())),
            };
            let now = Utc::now();

            for file in t
                .files
                .values_mut()
                .filter(|f| f.folder_id == Some(*folder_id))
            {
                file.folder_id = None;
                file.updated_at = now;
            }
            for child in t
                .folders
                .values_mut()
                .filter(|f| f.parent_id == Some(*folder_id))
            {
                child.parent_id = folder.parent_id;
                child.updated_at = now;
            }

            t.folders.remove(folder_id);
            Ok(())
        })
    }

    fn list_folders(&self, owner_id: &OwnerId) -> CatalogResult<Vec<Folder>> {
        let mut folders = self.read(|t| {
            t.folders
                .values()
                .filter(|f| &f.owner_id == owner_id)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        folders.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Ok(folders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpirationPolicy, FolderFilter};
    use tempfile::TempDir;

    fn record(owner: OwnerId, key: &str, size: u64) -> FileRecord {
        FileRecord::new(
            owner,
            format!("{}.bin", key),
            size,
            "application/octet-stream".to_string(),
            format!("uploads/{}/{}", owner, key),
            None,
        )
    }

    #[test]
    fn test_commit_increments_usage() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();

        catalog.commit_upload(record(owner, "a", 100)).unwrap();
        let outcome = catalog.commit_upload(record(owner, "b", 50)).unwrap();

        match outcome {
            CommitOutcome::Inserted { usage, .. } => assert_eq!(usage.total_bytes, 150),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(catalog.usage(&owner).unwrap().total_bytes, 150);
    }

    #[test]
    fn test_commit_is_idempotent_per_key() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();

        let first = catalog.commit_upload(record(owner, "a", 100)).unwrap().into_record();
        let second = catalog.commit_upload(record(owner, "a", 100)).unwrap();

        assert_eq!(second, CommitOutcome::AlreadyCommitted(first));
        assert_eq!(catalog.usage(&owner).unwrap().total_bytes, 100);
    }

    #[test]
    fn test_delete_recomputes_and_tombstones_shares() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();

        let keep = catalog.commit_upload(record(owner, "keep", 30)).unwrap().into_record();
        let gone = catalog.commit_upload(record(owner, "gone", 70)).unwrap().into_record();
        let share = catalog
            .insert_share(ShareLink::new(
                gone.id,
                owner,
                "token-1".to_string(),
                ExpirationPolicy::Never,
                Utc::now(),
            ))
            .unwrap();

        let usage = catalog.delete_file(&owner, &gone.id).unwrap();
        assert_eq!(usage.total_bytes, keep.size_bytes);
        assert!(catalog.get_file(&gone.id).unwrap().is_none());
        assert!(catalog.get_file_by_key(&gone.object_key).unwrap().is_none());
        assert!(catalog.get_share(&share.id).unwrap().unwrap().revoked);
    }

    #[test]
    fn test_delete_of_foreign_file_is_not_found() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();
        let file = catalog.commit_upload(record(owner, "a", 1)).unwrap().into_record();

        assert!(matches!(
            catalog.delete_file(&Uuid::new_v4(), &file.id),
            Err(CatalogError::FileNotFound(_))
        ));
        assert!(catalog.get_file(&file.id).unwrap().is_some());
    }

    #[test]
    fn test_reconcile_corrects_drift() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();
        catalog.commit_upload(record(owner, "a", 40)).unwrap();

        // Simulate drift
        catalog
            .transact(|t| {
                t.usage.get_mut(&owner).unwrap().total_bytes = 999;
                Ok(())
            })
            .unwrap();

        let rec = catalog.reconcile_usage(&owner).unwrap();
        assert!(rec.drifted());
        assert_eq!(rec.previous, 999);
        assert_eq!(rec.current, 40);
        assert_eq!(catalog.usage(&owner).unwrap().total_bytes, 40);
    }

    #[test]
    fn test_share_token_conflict() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();
        let file = catalog.commit_upload(record(owner, "a", 1)).unwrap().into_record();
        let now = Utc::now();

        let a = ShareLink::new(file.id, owner, "dup".into(), ExpirationPolicy::OneDay, now);
        let b = ShareLink::new(file.id, owner, "dup".into(), ExpirationPolicy::OneDay, now);
        catalog.insert_share(a).unwrap();
        assert!(matches!(catalog.insert_share(b), Err(CatalogError::Conflict(_))));
    }

    #[test]
    fn test_share_requires_file() {
        let catalog = LocalCatalog::in_memory();
        let share = ShareLink::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "tok".into(),
            ExpirationPolicy::OneDay,
            Utc::now(),
        );
        assert!(matches!(catalog.insert_share(share), Err(CatalogError::FileNotFound(_))));
    }

    #[test]
    fn test_revocation_is_sticky() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();
        let file = catalog.commit_upload(record(owner, "a", 1)).unwrap().into_record();
        let share = catalog
            .insert_share(ShareLink::new(file.id, owner, "t".into(), ExpirationPolicy::OneDay, Utc::now()))
            .unwrap();

        let stale = share.clone();
        let mut revoked = share;
        revoked.revoked = true;
        catalog.update_share(revoked).unwrap();

        assert!(matches!(catalog.update_share(stale), Err(CatalogError::Conflict(_))));
        assert!(catalog.get_share_by_token("t").unwrap().unwrap().revoked);
    }

    #[test]
    fn test_binding_insert_returns_existing() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();

        let first = catalog
            .insert_binding(BucketBinding::new(owner, "user-bucket-a".into()))
            .unwrap();
        let second = catalog
            .insert_binding(BucketBinding::new(owner, "user-bucket-b".into()))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.namespace, "user-bucket-a");
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();

        catalog.fail_next_writes(1);
        assert!(matches!(
            catalog.commit_upload(record(owner, "a", 10)),
            Err(CatalogError::WriteFailed(_))
        ));
        assert_eq!(catalog.usage(&owner).unwrap().total_bytes, 0);
        assert!(catalog.list_files(&owner, &FileQuery::default()).unwrap().is_empty());

        catalog.commit_upload(record(owner, "a", 10)).unwrap();
        assert_eq!(catalog.usage(&owner).unwrap().total_bytes, 10);
    }

    #[test]
    fn test_writes_from_many_owners_serialize_without_loss() {
        let catalog = LocalCatalog::in_memory();
        let owners: Vec<OwnerId> = (0..8).map(|_| Uuid::new_v4()).collect();

        std::thread::scope(|s| {
            for owner in &owners {
                let catalog = &catalog;
                s.spawn(move || {
                    for i in 0..25 {
                        catalog.commit_upload(record(*owner, &format!("f{}", i), 3)).unwrap();
                    }
                });
            }
        });

        for owner in &owners {
            assert_eq!(catalog.usage(owner).unwrap().total_bytes, 75);
            assert_eq!(catalog.list_files(owner, &FileQuery::default()).unwrap().len(), 25);
        }
    }

    #[test]
    fn test_folder_delete_rehomes_contents() {
        let catalog = LocalCatalog::in_memory();
        let owner = Uuid::new_v4();

        let parent = catalog.insert_folder(Folder::new(owner, "parent".into(), None)).unwrap();
        let doomed = catalog
            .insert_folder(Folder::new(owner, "doomed".into(), Some(parent.id)))
            .unwrap();
        let child = catalog
            .insert_folder(Folder::new(owner, "child".into(), Some(doomed.id)))
            .unwrap();
        let mut file = record(owner, "f", 5);
        file.folder_id = Some(doomed.id);
        let file = catalog.commit_upload(file).unwrap().into_record();

        catalog.delete_folder(&owner, &doomed.id).unwrap();

        assert!(catalog.get_folder(&doomed.id).unwrap().is_none());
        assert_eq!(catalog.get_folder(&child.id).unwrap().unwrap().parent_id, Some(parent.id));
        assert_eq!(catalog.get_file(&file.id).unwrap().unwrap().folder_id, None);

        let at_root = FileQuery { folder: FolderFilter::Root, ..FileQuery::default() };
        assert_eq!(catalog.list_files(&owner, &at_root).unwrap().len(), 1);
    }

    #[test]
    fn test_file_backed_catalog_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let file = {
            let catalog = LocalCatalog::open(&path).unwrap();
            let file = catalog.commit_upload(record(owner, "a", 64)).unwrap().into_record();
            catalog
                .insert_share(ShareLink::new(file.id, owner, "tok".into(), ExpirationPolicy::SevenDays, now))
                .unwrap();
            catalog.set_tier(&owner, AccountTier::Premium).unwrap();
            file
        };

        let reopened = LocalCatalog::open(&path).unwrap();
        assert_eq!(reopened.usage(&owner).unwrap().total_bytes, 64);
        assert_eq!(reopened.get_file_by_key(&file.object_key).unwrap().unwrap().id, file.id);
        assert!(reopened.get_share_by_token("tok").unwrap().is_some());
        assert_eq!(reopened.tier(&owner).unwrap(), AccountTier::Premium);
        assert_eq!(reopened.owners().unwrap(), vec![owner]);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        fs::write(&path, b"{not json").unwrap();

        assert!(matches!(LocalCatalog::open(&path), Err(CatalogError::Corrupt(_))));
    }
}
