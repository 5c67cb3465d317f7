//! # Share Link Issuer
//!
//! Creates, resolves, extends and revokes share links. Revocation is a
//! tombstone so holders of a revoked link get `ShareRevoked`, not
//! `ShareNotFound`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{CatalogError, MetadataCatalog};
use crate::errors::{VaultError, VaultResult};
use crate::model::{ExpirationPolicy, FileRecord, OwnerId, ShareLink, ShareState};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::token::{generate_share_token, is_well_formed};

/// Token collisions tolerated before giving up
const MAX_TOKEN_ATTEMPTS: usize = 5;

/// An active share and the file it grants access to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedShare {
    pub share: ShareLink,
    pub file: FileRecord,
}

#[derive(Debug)]
pub struct ShareLinkIssuer<C: ?Sized> {
    catalog: Arc<C>,
    metrics: Arc<MetricsRegistry>,
}

impl<C> ShareLinkIssuer<C>
where
    C: MetadataCatalog + ?Sized,
{
    pub fn new(catalog: Arc<C>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { catalog, metrics }
    }

    /// Create a link to one of the owner's files
    pub fn create_share(
        &self,
        owner_id: &OwnerId,
        file_id: &Uuid,
        policy: ExpirationPolicy,
    ) -> VaultResult<ShareLink> {
        let file = self
            .catalog
            .get_file(file_id)?
            .ok_or_else(|| VaultError::FileNotFound(file_id.to_string()))?;
        if &file.owner_id != owner_id {
            return Err(VaultError::Forbidden);
        }

        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let share = ShareLink::new(file.id, *owner_id, generate_share_token(), policy, Utc::now());
            match self.catalog.insert_share(share) {
                Ok(share) => {
                    self.metrics.increment_shares_created();
                    log_event_with_fields(
                        Event::ShareCreated,
                        &[
                            ("owner_id", &owner_id.to_string()),
                            ("file_id", &file.id.to_string()),
                            ("share_id", &share.id.to_string()),
                            ("expiration", policy.as_str()),
                        ],
                    );
                    return Ok(share);
                }
                Err(CatalogError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(VaultError::Internal(
            "could not allocate a unique share token".to_string(),
        ))
    }

    /// Resolve a token against the current time
    pub fn validate_share(&self, token: &str) -> VaultResult<ResolvedShare> {
        self.validate_share_at(token, Utc::now())
    }

    /// Resolve a token as of `now`
    pub fn validate_share_at(&self, token: &str, now: DateTime<Utc>) -> VaultResult<ResolvedShare> {
        let share = if is_well_formed(token) {
            self.catalog.get_share_by_token(token)?
        } else {
            None
        };

        let outcome = match share {
            None => Err(VaultError::ShareNotFound),
            Some(share) => match share.state(now) {
                ShareState::Active => self.shared_file(share),
                ShareState::Expired => Err(VaultError::ShareExpired),
                ShareState::Revoked => Err(VaultError::ShareRevoked),
            },
        };

        match &outcome {
            Ok(resolved) => {
                self.metrics.increment_shares_resolved();
                log_event_with_fields(
                    Event::ShareResolved,
                    &[
                        ("share_id", &resolved.share.id.to_string()),
                        ("file_id", &resolved.file.id.to_string()),
                    ],
                );
            }
            Err(e) => {
                self.metrics.increment_shares_rejected();
                log_event_with_fields(Event::ShareRejected, &[("kind", e.kind())]);
            }
        }

        outcome
    }

    /// A share whose file is gone counts as revoked
    fn shared_file(&self, share: ShareLink) -> VaultResult<ResolvedShare> {
        match self.catalog.get_file(&share.file_id)? {
            Some(file) => Ok(ResolvedShare { share, file }),
            None => Err(VaultError::ShareRevoked),
        }
    }

    /// Re-issue the expiry from now. Expired links may be extended,
    /// revoked ones may not.
    pub fn extend_expiration(
        &self,
        owner_id: &OwnerId,
        share_id: &Uuid,
        policy: ExpirationPolicy,
    ) -> VaultResult<ShareLink> {
        let mut share = self.owned_share(owner_id, share_id)?;
        if share.revoked {
            return Err(VaultError::ShareRevoked);
        }

        share.expires_at = policy.expires_at(Utc::now());
        let share = match self.catalog.update_share(share) {
            Ok(share) => share,
            // Revoked concurrently
            Err(CatalogError::Conflict(_)) => return Err(VaultError::ShareRevoked),
            Err(e) => return Err(e.into()),
        };

        log_event_with_fields(
            Event::ShareExtended,
            &[
                ("share_id", &share.id.to_string()),
                ("expiration", policy.as_str()),
            ],
        );
        Ok(share)
    }

    /// Tombstone a link. Revoking twice is a no-op.
    pub fn revoke(&self, owner_id: &OwnerId, share_id: &Uuid) -> VaultResult<ShareLink> {
        let mut share = self.owned_share(owner_id, share_id)?;
        if share.revoked {
            return Ok(share);
        }

        share.revoked = true;
        let share = self.catalog.update_share(share)?;

        self.metrics.increment_shares_revoked();
        log_event_with_fields(
            Event::ShareRevoked,
            &[
                ("owner_id", &owner_id.to_string()),
                ("share_id", &share.id.to_string()),
            ],
        );
        Ok(share)
    }

    /// The owner's links, newest first
    pub fn list_shares(&self, owner_id: &OwnerId) -> VaultResult<Vec<ShareLink>> {
        Ok(self.catalog.list_shares(owner_id)?)
    }

    fn owned_share(&self, owner_id: &OwnerId, share_id: &Uuid) -> VaultResult<ShareLink> {
        let share = self
            .catalog
            .get_share(share_id)?
            .ok_or(VaultError::ShareNotFound)?;
        if &share.owner_id != owner_id {
            return Err(VaultError::Forbidden);
        }
        Ok(share)
    }
}
