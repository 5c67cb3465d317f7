//! # Share Links
//!
//! A share link grants anonymous, time-bounded download access to one file.
//!
//! State machine: `Active(expires_at)` -> `Expired` (observed, never stored)
//! or -> `Revoked` (explicit tombstone). Only `Active` resolves.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OwnerId;
use crate::errors::VaultError;

/// How long a share link stays valid from the moment it is (re)issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationPolicy {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "never")]
    Never,
}

impl ExpirationPolicy {
    /// Concrete expiry for a link issued at `now`; `None` never expires
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ExpirationPolicy::OneHour => Some(now + Duration::hours(1)),
            ExpirationPolicy::OneDay => Some(now + Duration::hours(24)),
            ExpirationPolicy::SevenDays => Some(now + Duration::days(7)),
            ExpirationPolicy::ThirtyDays => Some(now + Duration::days(30)),
            ExpirationPolicy::Never => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationPolicy::OneHour => "1h",
            ExpirationPolicy::OneDay => "24h",
            ExpirationPolicy::SevenDays => "7d",
            ExpirationPolicy::ThirtyDays => "30d",
            ExpirationPolicy::Never => "never",
        }
    }
}

impl fmt::Display for ExpirationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpirationPolicy {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(ExpirationPolicy::OneHour),
            "24h" => Ok(ExpirationPolicy::OneDay),
            "7d" => Ok(ExpirationPolicy::SevenDays),
            "30d" => Ok(ExpirationPolicy::ThirtyDays),
            "never" => Ok(ExpirationPolicy::Never),
            other => Err(VaultError::InvalidInput(format!(
                "unknown expiration policy: {}",
                other
            ))),
        }
    }
}

/// Resolution state of a share link at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareState {
    Active,
    Expired,
    Revoked,
}

/// A share link record. Revocation tombstones, never deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub id: Uuid,
    pub file_id: Uuid,
    pub owner_id: OwnerId,
    /// Unguessable bearer token
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub revoked: bool,
}

impl ShareLink {
    pub fn new(
        file_id: Uuid,
        owner_id: OwnerId,
        token: String,
        policy: ExpirationPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_id,
            owner_id,
            token,
            expires_at: policy.expires_at(now),
            created_at: now,
            revoked: false,
        }
    }

    /// Revoked wins over expired so stale clients see the explicit signal
    pub fn state(&self, now: DateTime<Utc>) -> ShareState {
        if self.revoked {
            return ShareState::Revoked;
        }
        match self.expires_at {
            Some(expires_at) if expires_at <= now => ShareState::Expired,
            _ => ShareState::Active,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == ShareState::Active
    }
}
