//! # Data Model
//!
//! Records shared by the catalog, the coordinator and the share issuer,
//! plus the validation applied to names and object keys.

pub mod bucket;
pub mod file;
pub mod keys;
pub mod share;
pub mod usage;

pub use bucket::{namespace_for, BucketBinding};
pub use file::{FileQuery, FileRecord, FolderFilter, Folder, SortDirection, SortField};
pub use keys::{derive_object_key, key_belongs_to, owner_prefix, sanitize_key_segment, validate_content_type, validate_display_name};
pub use share::{ExpirationPolicy, ShareLink, ShareState};
pub use usage::{AccountTier, StorageSummary, StorageUsage, TierLimits};

use uuid::Uuid;

/// Identifier of the user owning files, shares and a namespace
pub type OwnerId = Uuid;
