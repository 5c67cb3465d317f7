//! # In-Memory Backend
//!
//! A `BlobStore` that keeps everything in a map. It counts calls per
//! operation and can be told to fail the next N calls of an operation with
//! `Unavailable`, which is how retry and "no backend contact" behavior is
//! tested.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Utc};

use super::backend::{validate_key, validate_namespace, BlobStore, Capability, CapabilityMethod};
use super::errors::{BlobError, BlobResult};

/// Operations of the blob contract, for call counting and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    CreateNamespace,
    NamespaceExists,
    IssueUpload,
    IssueDownload,
    ObjectExists,
    ObjectSize,
    DeleteObject,
}

#[derive(Debug, Default)]
struct MemoryState {
    namespaces: HashSet<String>,
    /// Object lengths; contents are never read back
    objects: HashMap<(String, String), u64>,
    calls: HashMap<BlobOp, u64>,
    pending_failures: HashMap<BlobOp, u32>,
    /// Namespaces that are created but report unreachable
    unreachable: HashSet<String>,
}

/// In-memory blob backend
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    state: Mutex<MemoryState>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> BlobResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| BlobError::Io("lock poisoned".to_string()))
    }

    /// Count the call and consume an injected failure if one is pending
    fn enter(&self, op: BlobOp) -> BlobResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock()?;
        *state.calls.entry(op).or_insert(0) += 1;

        if let Some(remaining) = state.pending_failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BlobError::Unavailable(format!("injected failure: {:?}", op)));
            }
        }
        Ok(state)
    }

    /// Fail the next `count` calls of `op` with `Unavailable`
    pub fn fail_next(&self, op: BlobOp, count: u32) {
        if let Ok(mut state) = self.lock() {
            state.pending_failures.insert(op, count);
        }
    }

    /// Make `namespace_exists` report false for a namespace
    pub fn mark_unreachable(&self, namespace: &str) {
        if let Ok(mut state) = self.lock() {
            state.unreachable.insert(namespace.to_string());
        }
    }

    /// Number of calls made to `op`
    pub fn calls(&self, op: BlobOp) -> u64 {
        self.lock()
            .map(|state| state.calls.get(&op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of calls made to any operation
    pub fn total_calls(&self) -> u64 {
        self.lock()
            .map(|state| state.calls.values().sum())
            .unwrap_or(0)
    }

    /// Simulate the caller's direct transfer against a PUT capability
    pub fn put_object(&self, namespace: &str, key: &str, data: &[u8]) -> BlobResult<()> {
        self.put_sized(namespace, key, data.len() as u64)
    }

    /// Like `put_object` for an object of `size` bytes, without the bytes
    pub fn put_sized(&self, namespace: &str, key: &str, size: u64) -> BlobResult<()> {
        validate_key(key)?;
        let mut state = self.lock()?;
        if !state.namespaces.contains(namespace) {
            return Err(BlobError::NamespaceNotFound(namespace.to_string()));
        }
        state
            .objects
            .insert((namespace.to_string(), key.to_string()), size);
        Ok(())
    }

    /// Drop an object behind the catalog's back
    pub fn remove_object(&self, namespace: &str, key: &str) {
        if let Ok(mut state) = self.lock() {
            state.objects.remove(&(namespace.to_string(), key.to_string()));
        }
    }

    pub fn object_count(&self) -> usize {
        self.lock().map(|state| state.objects.len()).unwrap_or(0)
    }

    pub fn namespace_count(&self) -> usize {
        self.lock().map(|state| state.namespaces.len()).unwrap_or(0)
    }

    fn capability(
        method: CapabilityMethod,
        namespace: &str,
        key: &str,
        content_type: Option<&str>,
        ttl: Duration,
    ) -> Capability {
        Capability {
            method,
            url: format!("memory://{}/{}?method={}", namespace, key, method),
            namespace: namespace.to_string(),
            key: key.to_string(),
            expires_at: Utc::now() + ttl,
            content_type: content_type.map(str::to_string),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn create_namespace(&self, namespace: &str) -> BlobResult<()> {
        validate_namespace(namespace)?;
        let mut state = self.enter(BlobOp::CreateNamespace)?;
        if !state.namespaces.insert(namespace.to_string()) {
            return Err(BlobError::AlreadyExists(namespace.to_string()));
        }
        Ok(())
    }

    fn namespace_exists(&self, namespace: &str) -> BlobResult<bool> {
        let state = self.enter(BlobOp::NamespaceExists)?;
        Ok(state.namespaces.contains(namespace) && !state.unreachable.contains(namespace))
    }

    fn issue_upload_capability(
        &self,
        namespace: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> BlobResult<Capability> {
        validate_key(key)?;
        let _state = self.enter(BlobOp::IssueUpload)?;
        Ok(Self::capability(CapabilityMethod::Put, namespace, key, Some(content_type), ttl))
    }

    fn issue_download_capability(
        &self,
        namespace: &str,
        key: &str,
        ttl: Duration,
    ) -> BlobResult<Capability> {
        validate_key(key)?;
        let _state = self.enter(BlobOp::IssueDownload)?;
        Ok(Self::capability(CapabilityMethod::Get, namespace, key, None, ttl))
    }

    fn object_exists(&self, namespace: &str, key: &str) -> BlobResult<bool> {
        let state = self.enter(BlobOp::ObjectExists)?;
        Ok(state
            .objects
            .contains_key(&(namespace.to_string(), key.to_string())))
    }

    fn object_size(&self, namespace: &str, key: &str) -> BlobResult<Option<u64>> {
        let state = self.enter(BlobOp::ObjectSize)?;
        Ok(state
            .objects
            .get(&(namespace.to_string(), key.to_string()))
            .copied())
    }

    fn delete_object(&self, namespace: &str, key: &str) -> BlobResult<()> {
        let mut state = self.enter(BlobOp::DeleteObject)?;
        state.objects.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}
