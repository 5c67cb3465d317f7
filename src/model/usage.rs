//! # Storage Usage and Tiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OwnerId;

/// The quota ledger row for one owner.
///
/// At any quiescent point `total_bytes` equals the sum of `size_bytes`
/// over the owner's file records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    pub owner_id: OwnerId,
    pub total_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

impl StorageUsage {
    /// Ledger for an owner that has never stored anything
    pub fn empty(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            total_bytes: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Subscription tier of an owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountTier {
    #[default]
    Free,
    Premium,
}

impl AccountTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountTier::Free => "free",
            AccountTier::Premium => "premium",
        }
    }
}

/// Limits applied to one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Total bytes an owner may store
    pub quota_bytes: u64,
    /// Largest single file an owner may upload
    pub max_file_bytes: u64,
}

impl TierLimits {
    /// Bytes still available given current usage
    pub fn remaining(&self, used_bytes: u64) -> u64 {
        self.quota_bytes.saturating_sub(used_bytes)
    }
}

/// Usage report for one owner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageSummary {
    pub owner_id: OwnerId,
    pub tier: AccountTier,
    pub used_bytes: u64,
    pub quota_bytes: u64,
    pub remaining_bytes: u64,
    pub max_file_bytes: u64,
    /// Rounded, capped at 100
    pub used_percent: u8,
}

impl StorageSummary {
    pub fn new(usage: &StorageUsage, tier: AccountTier, limits: TierLimits) -> Self {
        let used_percent = if limits.quota_bytes == 0 {
            100
        } else {
            let pct = (usage.total_bytes as f64 / limits.quota_bytes as f64 * 100.0).round();
            pct.min(100.0) as u8
        };

        Self {
            owner_id: usage.owner_id,
            tier,
            used_bytes: usage.total_bytes,
            quota_bytes: limits.quota_bytes,
            remaining_bytes: limits.remaining(usage.total_bytes),
            max_file_bytes: limits.max_file_bytes,
            used_percent,
        }
    }
}
