//! # Transfers
//!
//! Namespace provisioning and the upload/download/delete protocol. The
//! coordinator issues capabilities and commits metadata; file bytes flow
//! directly between the caller and the blob backend.

pub mod coordinator;
pub mod provisioner;

pub use coordinator::{ConfirmUpload, DownloadTicket, TransferCoordinator, UploadTicket};
pub use provisioner::BucketProvisioner;

use crate::blob::BlobResult;
use crate::observability::MetricsRegistry;
use crate::retry::RetryPolicy;

/// Run a blob backend call under the retry policy, counting retries
pub(crate) fn with_backend_retry<T>(
    policy: &RetryPolicy,
    metrics: &MetricsRegistry,
    operation: &str,
    call: impl FnMut() -> BlobResult<T>,
) -> BlobResult<T> {
    policy.run_with(operation, |_, _| metrics.increment_backend_retries(), call)
}
