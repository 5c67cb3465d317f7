//! # File Library
//!
//! Metadata-only operations over committed files and folders: listing,
//! renaming, moving, the folder tree and the storage summary. Nothing here
//! touches the blob backend or changes usage totals.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::catalog::MetadataCatalog;
use crate::config::TierConfig;
use crate::errors::{VaultError, VaultResult};
use crate::model::{
    validate_display_name, AccountTier, FileQuery, FileRecord, Folder, OwnerId, StorageSummary,
};

#[derive(Debug)]
pub struct FileLibrary<C: ?Sized> {
    catalog: Arc<C>,
    tiers: TierConfig,
}

impl<C> FileLibrary<C>
where
    C: MetadataCatalog + ?Sized,
{
    pub fn new(catalog: Arc<C>, tiers: TierConfig) -> Self {
        Self { catalog, tiers }
    }

    // ==================
    // Files
    // ==================

    pub fn list_files(&self, owner_id: &OwnerId, query: &FileQuery) -> VaultResult<Vec<FileRecord>> {
        Ok(self.catalog.list_files(owner_id, query)?)
    }

    /// Distinct content types of the owner's files, sorted
    pub fn file_types(&self, owner_id: &OwnerId) -> VaultResult<Vec<String>> {
        let files = self.catalog.list_files(owner_id, &FileQuery::default())?;
        let types: BTreeSet<String> = files.into_iter().map(|f| f.content_type).collect();
        Ok(types.into_iter().collect())
    }

    pub fn rename_file(&self, owner_id: &OwnerId, file_id: &Uuid, name: &str) -> VaultResult<FileRecord> {
        let name = validate_display_name(name)?;
        let mut file = self.owned_file(owner_id, file_id)?;
        file.name = name;
        file.updated_at = Utc::now();
        Ok(self.catalog.update_file(file)?)
    }

    /// Move a file into a folder, or to the root with `None`
    pub fn move_file(
        &self,
        owner_id: &OwnerId,
        file_id: &Uuid,
        folder_id: Option<Uuid>,
    ) -> VaultResult<FileRecord> {
        let mut file = self.owned_file(owner_id, file_id)?;
        if let Some(folder_id) = &folder_id {
            self.owned_folder(owner_id, folder_id)?;
        }
        file.folder_id = folder_id;
        file.updated_at = Utc::now();
        Ok(self.catalog.update_file(file)?)
    }

    // ==================
    // Folders
    // ==================

    pub fn create_folder(
        &self,
        owner_id: &OwnerId,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> VaultResult<Folder> {
        let name = validate_display_name(name)?;
        if let Some(parent_id) = &parent_id {
            self.owned_folder(owner_id, parent_id)?;
        }
        Ok(self.catalog.insert_folder(Folder::new(*owner_id, name, parent_id))?)
    }

    pub fn rename_folder(&self, owner_id: &OwnerId, folder_id: &Uuid, name: &str) -> VaultResult<Folder> {
        let name = validate_display_name(name)?;
        let mut folder = self.owned_folder(owner_id, folder_id)?;
        folder.name = name;
        folder.updated_at = Utc::now();
        Ok(self.catalog.update_folder(folder)?)
    }

    /// Delete a folder. Its files move to the root and its child folders
    /// move up to the deleted folder's parent.
    pub fn delete_folder(&self, owner_id: &OwnerId, folder_id: &Uuid) -> VaultResult<()> {
        self.owned_folder(owner_id, folder_id)?;
        Ok(self.catalog.delete_folder(owner_id, folder_id)?)
    }

    pub fn list_folders(&self, owner_id: &OwnerId) -> VaultResult<Vec<Folder>> {
        Ok(self.catalog.list_folders(owner_id)?)
    }

    /// Breadcrumb from the root down to `folder_id`
    pub fn folder_path(&self, owner_id: &OwnerId, folder_id: &Uuid) -> VaultResult<Vec<Folder>> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(*folder_id);

        while let Some(id) = next {
            if !seen.insert(id) {
                return Err(VaultError::Internal(format!("folder cycle at {}", id)));
            }
            let folder = self.owned_folder(owner_id, &id)?;
            next = folder.parent_id;
            path.push(folder);
        }

        path.reverse();
        Ok(path)
    }

    // ==================
    // Usage and tiers
    // ==================

    pub fn storage_summary(&self, owner_id: &OwnerId) -> VaultResult<StorageSummary> {
        let usage = self.catalog.usage(owner_id)?;
        let tier = self.catalog.tier(owner_id)?;
        Ok(StorageSummary::new(&usage, tier, self.tiers.limits_for(tier)))
    }

    pub fn set_tier(&self, owner_id: &OwnerId, tier: AccountTier) -> VaultResult<StorageSummary> {
        self.catalog.set_tier(owner_id, tier)?;
        self.storage_summary(owner_id)
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

    /// Foreign folders look missing so ids cannot be enumerated
    fn owned_folder(&self, owner_id: &OwnerId, folder_id: &Uuid) -> VaultResult<Folder> {
        match self.catalog.get_folder(folder_id)? {
            Some(folder) if &folder.owner_id == owner_id => Ok(folder),
            _ => Err(VaultError::FolderNotFound(folder_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LocalCatalog;
    use crate::model::{FolderFilter, SortDirection, SortField};

    const MB: u64 = 1024 * 1024;

    fn library() -> (FileLibrary<LocalCatalog>, Arc<LocalCatalog>) {
        let catalog = Arc::new(LocalCatalog::in_memory());
        (FileLibrary::new(Arc::clone(&catalog), TierConfig::default()), catalog)
    }

    fn commit(catalog: &LocalCatalog, owner: OwnerId, name: &str, size: u64, ct: &str) -> FileRecord {
        catalog
            .commit_upload(FileRecord::new(
                owner,
                name.to_string(),
                size,
                ct.to_string(),
                crate::model::derive_object_key(&owner, name),
                None,
            ))
            .unwrap()
            .into_record()
    }

    #[test]
    fn test_rename_and_move() {
        let (lib, catalog) = library();
        let owner = Uuid::new_v4();
        let file = commit(&catalog, owner, "a.txt", 10, "text/plain");
        let folder = lib.create_folder(&owner, "Docs", None).unwrap();

        let renamed = lib.rename_file(&owner, &file.id, "  b.txt ").unwrap();
        assert_eq!(renamed.name, "b.txt");
        assert_eq!(renamed.object_key, file.object_key);

        let moved = lib.move_file(&owner, &file.id, Some(folder.id)).unwrap();
        assert_eq!(moved.folder_id, Some(folder.id));

        let query = FileQuery { folder: FolderFilter::In(folder.id), ..Default::default() };
        assert_eq!(lib.list_files(&owner, &query).unwrap().len(), 1);

        let back = lib.move_file(&owner, &file.id, None).unwrap();
        assert_eq!(back.folder_id, None);
    }

    #[test]
    fn test_foreign_access() {
        let (lib, catalog) = library();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let file = commit(&catalog, owner, "a.txt", 10, "text/plain");
        let theirs = lib.create_folder(&stranger, "Theirs", None).unwrap();

        assert_eq!(lib.rename_file(&stranger, &file.id, "x"), Err(VaultError::Forbidden));
        assert!(matches!(
            lib.move_file(&owner, &file.id, Some(theirs.id)),
            Err(VaultError::FolderNotFound(_))
        ));
        assert!(matches!(
            lib.delete_folder(&owner, &theirs.id),
            Err(VaultError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let (lib, catalog) = library();
        let owner = Uuid::new_v4();
        let file = commit(&catalog, owner, "a.txt", 10, "text/plain");

        assert!(matches!(lib.rename_file(&owner, &file.id, "  "), Err(VaultError::InvalidInput(_))));
        assert!(matches!(lib.create_folder(&owner, "..", None), Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_file_types_are_distinct_and_sorted() {
        let (lib, catalog) = library();
        let owner = Uuid::new_v4();
        commit(&catalog, owner, "b.png", 1, "image/png");
        commit(&catalog, owner, "a.pdf", 1, "application/pdf");
        commit(&catalog, owner, "c.png", 1, "image/png");

        assert_eq!(lib.file_types(&owner).unwrap(), vec!["application/pdf", "image/png"]);
    }

    #[test]
    fn test_list_sorted_by_name() {
        let (lib, catalog) = library();
        let owner = Uuid::new_v4();
        commit(&catalog, owner, "beta", 1, "text/plain");
        commit(&catalog, owner, "Alpha", 1, "text/plain");

        let query = FileQuery {
            sort: SortField::Name,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let names: Vec<String> = lib.list_files(&owner, &query).unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);
    }

    #[test]
    fn test_folder_path_and_delete_reparents() {
        let (lib, catalog) = library();
        let owner = Uuid::new_v4();
        let top = lib.create_folder(&owner, "top", None).unwrap();
        let mid = lib.create_folder(&owner, "mid", Some(top.id)).unwrap();
        let leaf = lib.create_folder(&owner, "leaf", Some(mid.id)).unwrap();
        let file = commit(&catalog, owner, "a.txt", 1, "text/plain");
        lib.move_file(&owner, &file.id, Some(mid.id)).unwrap();

        let names: Vec<String> = lib.folder_path(&owner, &leaf.id).unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["top", "mid", "leaf"]);

        lib.delete_folder(&owner, &mid.id).unwrap();
        let names: Vec<String> = lib.folder_path(&owner, &leaf.id).unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["top", "leaf"]);
        assert_eq!(catalog.get_file(&file.id).unwrap().unwrap().folder_id, None);
    }

    #[test]
    fn test_folder_path_detects_cycles() {
        let (lib, catalog) = library();
        let owner = Uuid::new_v4();
        let a = lib.create_folder(&owner, "a", None).unwrap();
        let b = lib.create_folder(&owner, "b", Some(a.id)).unwrap();
        let mut looped = a.clone();
        looped.parent_id = Some(b.id);
        catalog.update_folder(looped).unwrap();

        assert!(matches!(lib.folder_path(&owner, &b.id), Err(VaultError::Internal(_))));
    }

    #[test]
    fn test_storage_summary_follows_tier() {
        let (lib, catalog) = library();
        let owner = Uuid::new_v4();
        commit(&catalog, owner, "a.bin", 25 * MB, "application/octet-stream");

        let free = lib.storage_summary(&owner).unwrap();
        assert_eq!(free.tier, AccountTier::Free);
        assert_eq!(free.used_bytes, 25 * MB);
        assert_eq!(free.quota_bytes, TierConfig::default().free.quota_bytes);

        let premium = lib.set_tier(&owner, AccountTier::Premium).unwrap();
        assert_eq!(premium.tier, AccountTier::Premium);
        assert_eq!(premium.quota_bytes, TierConfig::default().premium.quota_bytes);
        assert_eq!(premium.used_bytes, 25 * MB);
    }
}
