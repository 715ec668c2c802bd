//! Core provisioner types: requests, volume descriptors, and outcomes.
//!
//! The request and descriptor types mirror the subset of the Kubernetes
//! `PersistentVolumeClaim` / `PersistentVolume` objects the provisioner reads
//! and writes.  They are all [`Serialize`]/[`Deserialize`] (camelCase, as on
//! the API server) so the boundary adapter can exchange them as JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Annotation key under which the provisioner identity is stored on every
/// volume it creates.
pub const IDENTITY_ANNOTATION: &str = "hostPathProvisionerIdentity";

// ---------------------------------------------------------------------------
// Access mode, reclaim policy, quantity
// ---------------------------------------------------------------------------

/// Describes how a volume may be accessed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Single-node read-write.
    ReadWriteOnce,
    /// Multi-node read-only.
    ReadOnlyMany,
    /// Multi-node read-write.
    ReadWriteMany,
    /// Single-pod read-write.
    ReadWriteOncePod,
}

/// What happens to the backing storage once the claim is released.
///
/// Enforced by the external controller; the provisioner only echoes it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Remove the backing directory.
    Delete,
    /// Leave the backing directory for manual cleanup.
    Retain,
}

/// A resource quantity such as `"10Gi"`, carried verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Quantity(pub String);

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Quantity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request to provision backing storage for a claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    /// Namespace of the claim.
    pub namespace: String,
    /// Name of the claim.
    pub claim_name: String,
    /// Name the resulting volume must carry (generated by the controller).
    pub volume_name: String,
    /// Requested access modes.
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    /// Requested storage capacity.
    #[serde(default)]
    pub capacity: Quantity,
    /// Reclaim policy from the storage class.  Must be set by the caller.
    #[serde(default)]
    pub reclaim_policy: Option<ReclaimPolicy>,
    /// Storage class parameters.  Not interpreted by this backend.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Volume descriptor
// ---------------------------------------------------------------------------

/// Host directory backing a volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostPathSource {
    /// Absolute path of the backing directory.
    pub path: PathBuf,
}

/// The volume object produced by provisioning and handed back on deletion.
///
/// The controller persists this unchanged between the two calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDescriptor {
    /// Volume name.
    pub name: String,
    /// Object annotations; carries [`IDENTITY_ANNOTATION`].
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Capacity echoed from the request.
    #[serde(default)]
    pub capacity: Quantity,
    /// Access modes echoed from the request.
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    /// Reclaim policy echoed from the request.
    pub reclaim_policy: ReclaimPolicy,
    /// Backing directory.  Absent only on foreign or corrupted objects.
    #[serde(default)]
    pub host_path: Option<HostPathSource>,
}

impl VolumeDescriptor {
    /// The provisioner identity recorded on this volume, if any.
    pub fn identity(&self) -> Option<&str> {
        self.annotations.get(IDENTITY_ANNOTATION).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Outcomes & lifecycle
// ---------------------------------------------------------------------------

/// Successful result of a delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The backing directory was removed.
    Deleted,
    /// The backing directory did not exist; nothing to do.
    AlreadyAbsent,
    /// The volume was created by another provisioner identity and was left
    /// alone.  Not a failure: the controller should not retry here.
    DeclinedForeign {
        /// Identity recorded on the volume.
        owner: String,
    },
}

impl DeleteOutcome {
    /// Whether this instance took ownership of the deletion.
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::DeclinedForeign { .. })
    }
}

/// Lifecycle of a single volume as seen by the provisioner.
///
/// The controller is the authority on which state a volume is in; this type
/// only documents which transitions the provisioner can drive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VolumeState {
    /// No backing directory has been requested yet.
    Unprovisioned,
    /// Backing directory exists and a descriptor was returned.
    Provisioned,
    /// A delete call is in progress.
    Deleting,
    /// The backing directory is gone.
    Deleted,
    /// The delete call was declined because another instance owns the volume.
    DeclinedForeign,
}

impl VolumeState {
    /// Return `true` if the provisioner may move a volume from `self` to `next`.
    pub fn can_transition_to(self, next: VolumeState) -> bool {
        use VolumeState::*;
        matches!(
            (self, next),
            (Unprovisioned, Provisioned)
                | (Provisioned, Provisioned)
                | (Provisioned, Deleting)
                | (Deleting, Deleted)
                | (Deleting, DeclinedForeign)
        )
    }

    /// State reached by a finished delete call.
    pub fn after_delete(outcome: &DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted | DeleteOutcome::AlreadyAbsent => Self::Deleted,
            DeleteOutcome::DeclinedForeign { .. } => Self::DeclinedForeign,
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin info
// ---------------------------------------------------------------------------

/// Information about the running provisioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    /// Provisioner name used by the controller for claim routing.
    pub name: String,
    /// Identity stamped on created volumes.
    pub identity: String,
    /// Crate version.
    pub vendor_version: String,
}
