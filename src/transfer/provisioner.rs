//! # Bucket Provisioner
//!
//! Lazily creates one blob namespace per owner and records the binding.
//! The namespace name is derived from the owner id, so a retry or a
//! concurrent caller always targets the same namespace.

use std::sync::Arc;

use crate::blob::{BlobError, BlobStore};
use crate::catalog::MetadataCatalog;
use crate::errors::{VaultError, VaultResult};
use crate::model::{namespace_for, BucketBinding, OwnerId};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::retry::RetryPolicy;

use super::with_backend_retry;

#[derive(Debug)]
pub struct BucketProvisioner<B: ?Sized, C: ?Sized> {
    blob: Arc<B>,
    catalog: Arc<C>,
    retry: RetryPolicy,
    metrics: Arc<MetricsRegistry>,
}

impl<B, C> BucketProvisioner<B, C>
where
    B: BlobStore + ?Sized,
    C: MetadataCatalog + ?Sized,
{
    pub fn new(
        blob: Arc<B>,
        catalog: Arc<C>,
        retry: RetryPolicy,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            blob,
            catalog,
            retry,
            metrics,
        }
    }

    /// Namespace for `owner_id`, creating it on first use.
    ///
    /// An existing binding is returned without contacting the backend. On
    /// exhausted retries nothing is written to the catalog.
    pub fn ensure_namespace(&self, owner_id: &OwnerId) -> VaultResult<String> {
        if let Some(binding) = self.catalog.get_binding(owner_id)? {
            return Ok(binding.namespace);
        }

        let namespace = namespace_for(owner_id);

        if let Err(reason) = self.create_and_verify(&namespace) {
            self.metrics.increment_provisioning_failures();
            log_event_with_fields(
                Event::ProvisioningFailed,
                &[
                    ("owner_id", &owner_id.to_string()),
                    ("namespace", &namespace),
                    ("reason", &reason),
                ],
            );
            return Err(VaultError::ProvisioningFailed(reason));
        }

        let binding = self
            .catalog
            .insert_binding(BucketBinding::new(*owner_id, namespace))?;

        log_event_with_fields(
            Event::NamespaceProvisioned,
            &[
                ("owner_id", &owner_id.to_string()),
                ("namespace", &binding.namespace),
            ],
        );

        Ok(binding.namespace)
    }

    fn create_and_verify(&self, namespace: &str) -> Result<(), String> {
        with_backend_retry(&self.retry, &self.metrics, "create_namespace", || {
            match self.blob.create_namespace(namespace) {
                Ok(()) | Err(BlobError::AlreadyExists(_)) => Ok(()),
                Err(e) => Err(e),
            }
        })
        .map_err(|e| format!("create {}: {}", namespace, e))?;

        let reachable = with_backend_retry(&self.retry, &self.metrics, "namespace_exists", || {
            self.blob.namespace_exists(namespace)
        })
        .map_err(|e| format!("verify {}: {}", namespace, e))?;

        if !reachable {
            return Err(format!("{} not reachable after creation", namespace));
        }
        Ok(())
    }
}
