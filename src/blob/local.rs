//! # Local Filesystem Backend
//!
//! Namespaces are directories under `root`; objects are files below them.
//! Capabilities point at the server's own `/blob` endpoint, which calls
//! back into `verify_capability` before touching the disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::backend::{validate_key, validate_namespace, BlobStore, Capability, CapabilityMethod};
use super::errors::{BlobError, BlobResult};
use super::signed_url::{expiry_from_unix, CapabilitySigner, SignedRequest};

/// Local filesystem blob backend
#[derive(Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
    signer: CapabilitySigner,
}

impl LocalBlobStore {
    /// Create a new local backend rooted at `root`
    pub fn new(root: PathBuf, base_url: impl Into<String>, signing_secret: &[u8]) -> Self {
        Self {
            root,
            base_url: base_url.into(),
            signer: CapabilitySigner::new(signing_secret),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &str) -> BlobResult<PathBuf> {
        validate_namespace(namespace)?;
        Ok(self.root.join(namespace))
    }

    fn object_path(&self, namespace: &str, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        let dir = self.namespace_dir(namespace)?;
        if !dir.is_dir() {
            return Err(BlobError::NamespaceNotFound(namespace.to_string()));
        }
        Ok(dir.join(key))
    }

    fn capability(
        &self,
        method: CapabilityMethod,
        namespace: &str,
        key: &str,
        content_type: Option<&str>,
        ttl: Duration,
    ) -> BlobResult<Capability> {
        validate_namespace(namespace)?;
        validate_key(key)?;

        let request = SignedRequest {
            method,
            namespace,
            key,
            content_type,
            expires: (Utc::now() + ttl).timestamp(),
        };

        Ok(Capability {
            method,
            url: self.signer.to_url(&self.base_url, &request),
            namespace: namespace.to_string(),
            key: key.to_string(),
            expires_at: expiry_from_unix(request.expires)?,
            content_type: content_type.map(str::to_string),
        })
    }

    /// Check a presented capability against its signature
    pub fn verify_capability(
        &self,
        request: &SignedRequest<'_>,
        signature: &str,
        now: DateTime<Utc>,
    ) -> BlobResult<()> {
        self.signer.verify(request, signature, now)
    }

    /// Store object bytes (the direct transfer behind a PUT capability)
    pub fn write_object(&self, namespace: &str, key: &str, data: &[u8]) -> BlobResult<()> {
        let path = self.object_path(namespace, key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers never see a partially written object
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        fs::write(&tmp, data)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Read object bytes (the direct transfer behind a GET capability)
    pub fn read_object(&self, namespace: &str, key: &str) -> BlobResult<Vec<u8>> {
        let path = self.object_path(namespace, key)?;

        fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BlobError::ObjectNotFound(key.to_string())
            } else {
                BlobError::Io(e.to_string())
            }
        })
    }
}

impl BlobStore for LocalBlobStore {
    fn create_namespace(&self, namespace: &str) -> BlobResult<()> {
        let dir = self.namespace_dir(namespace)?;

        fs::create_dir_all(&self.root)?;
        match fs::create_dir(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(BlobError::AlreadyExists(namespace.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn namespace_exists(&self, namespace: &str) -> BlobResult<bool> {
        Ok(self.namespace_dir(namespace)?.is_dir())
    }

    fn issue_upload_capability(
        &self,
        namespace: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> BlobResult<Capability> {
        self.capability(CapabilityMethod::Put, namespace, key, Some(content_type), ttl)
    }

    fn issue_download_capability(
        &self,
        namespace: &str,
        key: &str,
        ttl: Duration,
    ) -> BlobResult<Capability> {
        self.capability(CapabilityMethod::Get, namespace, key, None, ttl)
    }

    fn object_exists(&self, namespace: &str, key: &str) -> BlobResult<bool> {
        validate_key(key)?;
        Ok(self.namespace_dir(namespace)?.join(key).is_file())
    }

    fn object_size(&self, namespace: &str, key: &str) -> BlobResult<Option<u64>> {
        validate_key(key)?;
        let path = self.namespace_dir(namespace)?.join(key);

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_object(&self, namespace: &str, key: &str) -> BlobResult<()> {
        validate_key(key)?;
        let path = self.namespace_dir(namespace)?.join(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NS: &str = "user-bucket-test";

    fn store(temp: &TempDir) -> LocalBlobStore {
        LocalBlobStore::new(temp.path().to_path_buf(), "http://localhost:54321", b"local-secret")
    }

    #[test]
    fn test_namespace_lifecycle() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(!store.namespace_exists(NS).unwrap());
        store.create_namespace(NS).unwrap();
        assert!(store.namespace_exists(NS).unwrap());
        assert_eq!(store.create_namespace(NS), Err(BlobError::AlreadyExists(NS.to_string())));
    }

    #[test]
    fn test_write_read_delete() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.create_namespace(NS).unwrap();

        let key = "uploads/o/1-a-notes.txt";
        store.write_object(NS, key, b"hello").unwrap();
        assert!(store.object_exists(NS, key).unwrap());
        assert_eq!(store.read_object(NS, key).unwrap(), b"hello");
        assert_eq!(store.object_size(NS, key).unwrap(), Some(5));

        store.delete_object(NS, key).unwrap();
        assert!(!store.object_exists(NS, key).unwrap());
        assert_eq!(store.object_size(NS, key).unwrap(), None);
        // Idempotent
        store.delete_object(NS, key).unwrap();
    }

    #[test]
    fn test_missing_namespace() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(matches!(
            store.write_object(NS, "a/b", b"x"),
            Err(BlobError::NamespaceNotFound(_))
        ));
    }

    #[test]
    fn test_traversal_rejected() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.create_namespace(NS).unwrap();

        assert!(matches!(
            store.write_object(NS, "../escape.txt", b"x"),
            Err(BlobError::InvalidKey(_))
        ));
        assert!(matches!(
            store.create_namespace("../etc"),
            Err(BlobError::InvalidNamespace(_))
        ));
    }

    #[test]
    fn test_capabilities_verify() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let key = "uploads/o/1-a-photo.png";

        let cap = store
            .issue_upload_capability(NS, key, "image/png", Duration::seconds(60))
            .unwrap();
        assert_eq!(cap.method, CapabilityMethod::Put);
        assert_eq!(cap.content_type.as_deref(), Some("image/png"));
        assert!(cap.url.contains("/blob/user-bucket-test/uploads/o/1-a-photo.png?"));

        let signature = cap.url.split("signature=").nth(1).unwrap();
        let request = SignedRequest {
            method: CapabilityMethod::Put,
            namespace: NS,
            key,
            content_type: Some("image/png"),
            expires: cap.expires_at.timestamp(),
        };
        assert!(store.verify_capability(&request, signature, Utc::now()).is_ok());

        let download = store
            .issue_download_capability(NS, key, Duration::seconds(60))
            .unwrap();
        assert_eq!(download.method, CapabilityMethod::Get);
        assert!(download.content_type.is_none());
    }
}
