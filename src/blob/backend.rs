//! # Blob Store Contract
//!
//! The coordinator never moves file bytes. It asks a `BlobStore` for
//! short-lived capabilities and the caller transfers directly against the
//! backend with them.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::{BlobError, BlobResult};

/// Longest object key a backend accepts
pub const MAX_KEY_LEN: usize = 1024;

/// HTTP method a capability authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CapabilityMethod {
    Put,
    Get,
}

impl CapabilityMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityMethod::Put => "PUT",
            CapabilityMethod::Get => "GET",
        }
    }
}

impl fmt::Display for CapabilityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityMethod {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PUT" => Ok(CapabilityMethod::Put),
            "GET" => Ok(CapabilityMethod::Get),
            _ => Err(BlobError::InvalidSignature),
        }
    }
}

/// A short-lived, single-object transfer handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capability {
    pub method: CapabilityMethod,
    pub url: String,
    pub namespace: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
    /// Content type the upload must be sent with (PUT only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Backend trait for blob storage
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Create a namespace; `AlreadyExists` if it is already there
    fn create_namespace(&self, namespace: &str) -> BlobResult<()>;

    /// Check if a namespace is reachable
    fn namespace_exists(&self, namespace: &str) -> BlobResult<bool>;

    /// Mint a PUT capability for one key
    fn issue_upload_capability(
        &self,
        namespace: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> BlobResult<Capability>;

    /// Mint a GET capability for one key
    fn issue_download_capability(
        &self,
        namespace: &str,
        key: &str,
        ttl: Duration,
    ) -> BlobResult<Capability>;

    /// HEAD-style existence check
    fn object_exists(&self, namespace: &str, key: &str) -> BlobResult<bool>;

    /// HEAD-style size lookup; `None` when the object is absent
    fn object_size(&self, namespace: &str, key: &str) -> BlobResult<Option<u64>>;

    /// Delete an object. Deleting a missing object succeeds.
    fn delete_object(&self, namespace: &str, key: &str) -> BlobResult<()>;
}

fn namespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,61}[a-z0-9]$").expect("valid regex"))
}

/// Check a namespace against S3 bucket naming rules
pub fn validate_namespace(namespace: &str) -> BlobResult<()> {
    if !namespace_pattern().is_match(namespace) || namespace.contains("--") {
        return Err(BlobError::InvalidNamespace(namespace.to_string()));
    }
    Ok(())
}

/// Check that an object key is a relative path with no traversal
pub fn validate_key(key: &str) -> BlobResult<()> {
    let invalid = || BlobError::InvalidKey(key.to_string());

    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(invalid());
    }
    if key.starts_with('/') || key.contains('\\') || key.chars().any(|c| c.is_control()) {
        return Err(invalid());
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid());
    }
    Ok(())
}
