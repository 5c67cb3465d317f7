//! # Metadata Catalog
//!
//! File records, usage ledgers, share links, bucket bindings, tiers and
//! folders, behind the transactional `MetadataCatalog` contract.

pub mod errors;
pub mod local;
pub mod store;

pub use errors::{CatalogError, CatalogResult};
pub use local::LocalCatalog;
pub use store::{CommitOutcome, MetadataCatalog, Reconciliation};
