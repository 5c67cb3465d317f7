//! # Maintenance
//!
//! Out-of-band backstops for the quota ledger and the file catalog.
//!
//! The sweep recomputes every owner's usage from their file records. The
//! audit reports records whose backing object is gone. Neither deletes
//! anything; orphaned objects from abandoned uploads are left alone since
//! the blob contract cannot enumerate them.

use std::sync::Arc;

use serde::Serialize;

use crate::blob::BlobStore;
use crate::catalog::{MetadataCatalog, Reconciliation};
use crate::errors::VaultResult;
use crate::model::{FileQuery, FileRecord, OwnerId};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::retry::RetryPolicy;
use crate::transfer::with_backend_retry;

/// Outcome of one usage sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub owners_checked: usize,
    /// Owners whose stored total differed from the recomputed one
    pub corrections: Vec<Reconciliation>,
}

/// A record whose object no longer exists in the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingObject {
    pub file_id: uuid::Uuid,
    pub owner_id: OwnerId,
    pub object_key: String,
}

impl From<&FileRecord> for MissingObject {
    fn from(file: &FileRecord) -> Self {
        Self {
            file_id: file.id,
            owner_id: file.owner_id,
            object_key: file.object_key.clone(),
        }
    }
}

/// Full maintenance pass, as printed by `cloudvault reconcile`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub sweep: SweepReport,
    pub missing_objects: Vec<MissingObject>,
}

#[derive(Debug)]
pub struct UsageReconciler<B: ?Sized, C: ?Sized> {
    blob: Arc<B>,
    catalog: Arc<C>,
    retry: RetryPolicy,
    metrics: Arc<MetricsRegistry>,
}

impl<B, C> UsageReconciler<B, C>
where
    B: BlobStore + ?Sized,
    C: MetadataCatalog + ?Sized,
{
    pub fn new(blob: Arc<B>, catalog: Arc<C>, retry: RetryPolicy, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            blob,
            catalog,
            retry,
            metrics,
        }
    }

    /// Recompute every owner's usage total
    pub fn sweep(&self) -> VaultResult<SweepReport> {
        let owners = self.catalog.owners()?;
        let mut report = SweepReport {
            owners_checked: owners.len(),
            corrections: Vec::new(),
        };

        for owner_id in &owners {
            let reconciliation = self.catalog.reconcile_usage(owner_id)?;
            self.metrics.increment_reconciliations();

            if reconciliation.drifted() {
                self.metrics.increment_drift_corrections();
                log_event_with_fields(
                    Event::UsageDriftCorrected,
                    &[
                        ("owner_id", &owner_id.to_string()),
                        ("previous", &reconciliation.previous.to_string()),
                        ("current", &reconciliation.current.to_string()),
                    ],
                );
                report.corrections.push(reconciliation);
            }
        }

        log_event_with_fields(
            Event::UsageReconciled,
            &[
                ("owners_checked", &report.owners_checked.to_string()),
                ("corrections", &report.corrections.len().to_string()),
            ],
        );
        Ok(report)
    }

    /// Records of `owner_id` whose object is missing from the backend
    pub fn audit_backing_objects(&self, owner_id: &OwnerId) -> VaultResult<Vec<MissingObject>> {
        let files = self.catalog.list_files(owner_id, &FileQuery::default())?;
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let namespace = match self.catalog.get_binding(owner_id)? {
            Some(binding) => binding.namespace,
            None => return Ok(files.iter().map(MissingObject::from).collect()),
        };

        let mut missing = Vec::new();
        for file in &files {
            let exists = with_backend_retry(&self.retry, &self.metrics, "object_exists", || {
                self.blob.object_exists(&namespace, &file.object_key)
            })?;
            if !exists {
                missing.push(MissingObject::from(file));
            }
        }
        Ok(missing)
    }

    /// Sweep, then audit every owner
    pub fn run(&self) -> VaultResult<MaintenanceReport> {
        let sweep = self.sweep()?;
        let mut missing_objects = Vec::new();
        for owner_id in self.catalog.owners()? {
            missing_objects.extend(self.audit_backing_objects(&owner_id)?);
        }
        Ok(MaintenanceReport {
            sweep,
            missing_objects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::catalog::LocalCatalog;
    use crate::model::{derive_object_key, namespace_for, BucketBinding};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn commit(catalog: &LocalCatalog, owner: OwnerId, name: &str, size: u64) -> FileRecord {
        catalog
            .commit_upload(FileRecord::new(
                owner,
                name.to_string(),
                size,
                "text/plain".to_string(),
                derive_object_key(&owner, name),
                None,
            ))
            .unwrap()
            .into_record()
    }

    /// Rewrite one owner's stored total behind the catalog's back
    fn corrupt_usage(path: &std::path::Path, owner: &OwnerId, total: u64) {
        let mut doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        doc["usage"][owner.to_string()]["total_bytes"] = serde_json::json!(total);
        std::fs::write(path, serde_json::to_string(&doc).unwrap()).unwrap();
    }

    #[test]
    fn test_sweep_without_drift() {
        let catalog = Arc::new(LocalCatalog::in_memory());
        let owner = Uuid::new_v4();
        commit(&catalog, owner, "a", 10);
        commit(&catalog, owner, "b", 5);

        let metrics = Arc::new(MetricsRegistry::new());
        let reconciler = UsageReconciler::new(
            Arc::new(MemoryBlobStore::new()),
            catalog,
            RetryPolicy::immediate(1),
            Arc::clone(&metrics),
        );
        let report = reconciler.sweep().unwrap();

        assert_eq!(report.owners_checked, 1);
        assert!(report.corrections.is_empty());
        assert_eq!(metrics.snapshot().reconciliations, 1);
    }

    #[test]
    fn test_sweep_corrects_drift() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let owner = Uuid::new_v4();
        {
            let catalog = LocalCatalog::open(&path).unwrap();
            commit(&catalog, owner, "a", 10);
            commit(&catalog, owner, "b", 5);
        }
        corrupt_usage(&path, &owner, 999);

        let catalog = Arc::new(LocalCatalog::open(&path).unwrap());
        assert_eq!(catalog.usage(&owner).unwrap().total_bytes, 999);

        let metrics = Arc::new(MetricsRegistry::new());
        let reconciler = UsageReconciler::new(
            Arc::new(MemoryBlobStore::new()),
            Arc::clone(&catalog),
            RetryPolicy::immediate(1),
            Arc::clone(&metrics),
        );
        let report = reconciler.sweep().unwrap();

        assert_eq!(
            report.corrections,
            vec![Reconciliation { owner_id: owner, previous: 999, current: 15 }]
        );
        assert_eq!(catalog.usage(&owner).unwrap().total_bytes, 15);
        assert_eq!(metrics.snapshot().drift_corrections, 1);

        // A second pass finds nothing
        assert!(reconciler.sweep().unwrap().corrections.is_empty());
    }

    #[test]
    fn test_audit_reports_missing_objects_without_deleting() {
        let blob = Arc::new(MemoryBlobStore::new());
        let catalog = Arc::new(LocalCatalog::in_memory());
        let owner = Uuid::new_v4();
        let namespace = namespace_for(&owner);
        blob.create_namespace(&namespace).unwrap();
        catalog.insert_binding(BucketBinding::new(owner, namespace.clone())).unwrap();

        let present = commit(&catalog, owner, "present", 1);
        let gone = commit(&catalog, owner, "gone", 1);
        blob.put_object(&namespace, &present.object_key, b"x").unwrap();

        let reconciler = UsageReconciler::new(
            Arc::clone(&blob),
            Arc::clone(&catalog),
            RetryPolicy::immediate(1),
            Arc::new(MetricsRegistry::new()),
        );
        let missing = reconciler.audit_backing_objects(&owner).unwrap();

        assert_eq!(missing, vec![MissingObject::from(&gone)]);
        assert!(catalog.get_file(&gone.id).unwrap().is_some());
    }

    #[test]
    fn test_run_combines_sweep_and_audit() {
        let blob = Arc::new(MemoryBlobStore::new());
        let catalog = Arc::new(LocalCatalog::in_memory());
        let owner = Uuid::new_v4();
        let file = commit(&catalog, owner, "unbound", 3);

        let reconciler = UsageReconciler::new(
            blob,
            catalog,
            RetryPolicy::immediate(1),
            Arc::new(MetricsRegistry::new()),
        );
        let report = reconciler.run().unwrap();

        assert_eq!(report.sweep.owners_checked, 1);
        assert_eq!(report.missing_objects, vec![MissingObject::from(&file)]);
    }
}
