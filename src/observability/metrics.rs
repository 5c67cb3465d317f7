//! Metrics registry
//!
//! Monotonic counters only, reset on process start. Relaxed ordering is
//! enough: each counter is independent and read for reporting only.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    uploads_requested: AtomicU64,
    uploads_rejected: AtomicU64,
    uploads_confirmed: AtomicU64,
    bytes_committed: AtomicU64,
    downloads_issued: AtomicU64,
    files_deleted: AtomicU64,
    shares_created: AtomicU64,
    shares_resolved: AtomicU64,
    shares_rejected: AtomicU64,
    shares_revoked: AtomicU64,
    backend_retries: AtomicU64,
    provisioning_failures: AtomicU64,
    metadata_write_failures: AtomicU64,
    reconciliations: AtomicU64,
    drift_corrections: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Transfers

    pub fn increment_uploads_requested(&self) {
        bump(&self.uploads_requested);
    }

    pub fn increment_uploads_rejected(&self) {
        bump(&self.uploads_rejected);
    }

    /// Count a committed upload and its bytes
    pub fn record_upload_confirmed(&self, size_bytes: u64) {
        bump(&self.uploads_confirmed);
        self.bytes_committed.fetch_add(size_bytes, Ordering::Relaxed);
    }

    pub fn increment_downloads_issued(&self) {
        bump(&self.downloads_issued);
    }

    pub fn increment_files_deleted(&self) {
        bump(&self.files_deleted);
    }

    pub fn increment_metadata_write_failures(&self) {
        bump(&self.metadata_write_failures);
    }

    // Sharing

    pub fn increment_shares_created(&self) {
        bump(&self.shares_created);
    }

    pub fn increment_shares_resolved(&self) {
        bump(&self.shares_resolved);
    }

    pub fn increment_shares_rejected(&self) {
        bump(&self.shares_rejected);
    }

    pub fn increment_shares_revoked(&self) {
        bump(&self.shares_revoked);
    }

    // Backend

    pub fn increment_backend_retries(&self) {
        bump(&self.backend_retries);
    }

    pub fn increment_provisioning_failures(&self) {
        bump(&self.provisioning_failures);
    }

    // Maintenance

    pub fn increment_reconciliations(&self) {
        bump(&self.reconciliations);
    }

    pub fn increment_drift_corrections(&self) {
        bump(&self.drift_corrections);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            uploads_requested: load(&self.uploads_requested),
            uploads_rejected: load(&self.uploads_rejected),
            uploads_confirmed: load(&self.uploads_confirmed),
            bytes_committed: load(&self.bytes_committed),
            downloads_issued: load(&self.downloads_issued),
            files_deleted: load(&self.files_deleted),
            shares_created: load(&self.shares_created),
            shares_resolved: load(&self.shares_resolved),
            shares_rejected: load(&self.shares_rejected),
            shares_revoked: load(&self.shares_revoked),
            backend_retries: load(&self.backend_retries),
            provisioning_failures: load(&self.provisioning_failures),
            metadata_write_failures: load(&self.metadata_write_failures),
            reconciliations: load(&self.reconciliations),
            drift_corrections: load(&self.drift_corrections),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uploads_requested: u64,
    pub uploads_rejected: u64,
    pub uploads_confirmed: u64,
    pub bytes_committed: u64,
    pub downloads_issued: u64,
    pub files_deleted: u64,
    pub shares_created: u64,
    pub shares_resolved: u64,
    pub shares_rejected: u64,
    pub shares_revoked: u64,
    pub backend_retries: u64,
    pub provisioning_failures: u64,
    pub metadata_write_failures: u64,
    pub reconciliations: u64,
    pub drift_corrections: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_registry_is_zeroed() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.uploads_confirmed, 0);
        assert_eq!(snapshot.bytes_committed, 0);
        assert_eq!(snapshot.backend_retries, 0);
    }

    #[test]
    fn test_upload_bytes_accumulate() {
        let registry = MetricsRegistry::new();
        registry.record_upload_confirmed(100);
        registry.record_upload_confirmed(50);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.uploads_confirmed, 2);
        assert_eq!(snapshot.bytes_committed, 150);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_shares_created();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["shares_created"], 1);
        assert_eq!(json["shares_revoked"], 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let registry = Arc::new(MetricsRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..250 {
                        registry.increment_downloads_issued();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.snapshot().downloads_issued, 2000);
    }
}
