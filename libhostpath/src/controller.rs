//! Provisioner service trait.
//!
//! The external reconciliation controller calls into this trait whenever a
//! claim needs backing storage or a released volume must be reclaimed.  Retry,
//! backoff and ordering between the two calls are owned by the controller.

use async_trait::async_trait;

use crate::error::ProvisionError;
use crate::types::{DeleteOutcome, ProvisionRequest, VolumeDescriptor};

/// Volume provisioning — create and reclaim backing storage.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Provision backing storage for a claim.
    ///
    /// Idempotent: calling it again for the same claim returns an equivalent
    /// descriptor without failing on the already existing directory.
    async fn provision(&self, req: ProvisionRequest) -> Result<VolumeDescriptor, ProvisionError>;

    /// Reclaim the backing storage of a volume previously returned by
    /// [`Self::provision`].
    ///
    /// Volumes stamped with another identity are left untouched and reported
    /// as [`DeleteOutcome::DeclinedForeign`].
    async fn delete(&self, volume: &VolumeDescriptor) -> Result<DeleteOutcome, ProvisionError>;
}
