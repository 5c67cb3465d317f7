//! # Blob Storage
//!
//! The `BlobStore` contract consumed by the coordinator, the capability
//! signer, and two backends: a filesystem store served by the local
//! `/blob` endpoint and an in-memory store used by tests.

pub mod backend;
pub mod errors;
pub mod local;
pub mod memory;
pub mod signed_url;

pub use backend::{validate_key, validate_namespace, BlobStore, Capability, CapabilityMethod};
pub use errors::{BlobError, BlobResult};
pub use local::LocalBlobStore;
pub use memory::{BlobOp, MemoryBlobStore};
pub use signed_url::{CapabilitySigner, SignedRequest};
