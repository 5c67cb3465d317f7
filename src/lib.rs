//! cloudvault - transfer and quota coordination for object-storage backed
//! file vaults
//!
//! File bytes move directly between clients and the blob backend under
//! short-lived signed capabilities. This crate provisions namespaces,
//! admits uploads against tier quotas, commits metadata and usage
//! atomically, and issues share links.

pub mod blob;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod http_server;
pub mod library;
pub mod maintenance;
pub mod model;
pub mod observability;
pub mod retry;
pub mod service;
pub mod sharing;
pub mod transfer;

pub use config::VaultConfig;
pub use errors::{VaultError, VaultResult};
pub use service::{DynVaultService, VaultService};
