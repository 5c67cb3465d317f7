//! # Bucket Bindings
//!
//! One namespace per owner, created lazily before the first transfer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OwnerId;

/// Persistent link between an owner and their blob namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketBinding {
    pub owner_id: OwnerId,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
}

impl BucketBinding {
    pub fn new(owner_id: OwnerId, namespace: String) -> Self {
        Self {
            owner_id,
            namespace,
            created_at: Utc::now(),
        }
    }
}

/// Deterministic namespace name for an owner, so retries reuse one target
pub fn namespace_for(owner_id: &OwnerId) -> String {
    format!("user-bucket-{}", owner_id.simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_namespace_is_deterministic() {
        let owner = Uuid::new_v4();
        assert_eq!(namespace_for(&owner), namespace_for(&owner));
        assert_ne!(namespace_for(&owner), namespace_for(&Uuid::new_v4()));
    }

    #[test]
    fn test_namespace_fits_bucket_rules() {
        let name = namespace_for(&Uuid::new_v4());
        assert!(name.len() <= 63);
        assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }
}
