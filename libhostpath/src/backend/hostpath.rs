//! Local host-path storage backend.
//!
//! [`HostPathBackend`] implements [`ProvisionerIdentity`] and [`Provisioner`]
//! by allocating one plain directory per claim under the configured root.
//! Nothing is written next to the volume data: ownership is tracked solely
//! through the identity annotation on the returned [`VolumeDescriptor`].
//!
//! Volume directories are made world read/write/execute.  The provisioner and
//! the workloads consuming a volume run under unrelated UIDs/GIDs, so the
//! directory has to be usable by anyone.

use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, instrument};

use crate::config::ProvisionerConfig;
use crate::controller::Provisioner;
use crate::error::{ProvisionError, StorageOp};
use crate::identity::ProvisionerIdentity;
use crate::path::{is_within_root, volume_path};
use crate::types::*;

/// Permission bits applied to every volume directory.
pub const VOLUME_MODE: u32 = 0o777;

/// Provisioner backed by directories on the local filesystem.
///
/// # Thread safety
///
/// Calls for different claims touch disjoint directories and never contend.
/// Calls for the same claim are serialised by a per-path async lock held in
/// a [`DashMap`], so a retried provision cannot interleave with a delete of
/// the same directory inside this process.
pub struct HostPathBackend {
    config: ProvisionerConfig,
    /// Per-volume-directory locks, created on first use.
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl HostPathBackend {
    /// Create a new backend after validating `config`.
    ///
    /// The root directory itself is not created here; it is created lazily
    /// together with the first volume directory.
    pub fn new(config: ProvisionerConfig) -> Result<Self, ProvisionError> {
        config.validate()?;
        Ok(Self {
            config,
            locks: DashMap::new(),
        })
    }

    /// Configuration this backend was built with.
    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Resolve the backing directory for a claim.
    pub fn volume_path(&self, namespace: &str, claim: &str) -> Result<PathBuf, ProvisionError> {
        volume_path(&self.config.root, namespace, claim)
    }

    /// Acquire the lock for `path`, creating its table entry on first use.
    async fn lock_path(&self, path: &Path) -> PathLockGuard<'_> {
        let lock = {
            let entry = self.locks.entry(path.to_path_buf()).or_default();
            Arc::clone(entry.value())
        };
        PathLockGuard {
            locks: &self.locks,
            path: path.to_path_buf(),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn descriptor(
        &self,
        req: ProvisionRequest,
        reclaim_policy: ReclaimPolicy,
        path: PathBuf,
    ) -> VolumeDescriptor {
        VolumeDescriptor {
            name: req.volume_name,
            annotations: BTreeMap::from([(
                IDENTITY_ANNOTATION.to_owned(),
                self.config.identity.clone(),
            )]),
            capacity: req.capacity,
            access_modes: req.access_modes,
            reclaim_policy,
            host_path: Some(HostPathSource { path }),
        }
    }
}

/// Held for the duration of one operation on a volume directory.
///
/// On drop the lock is released and the table entry removed unless another
/// call still holds a reference to it.
struct PathLockGuard<'a> {
    locks: &'a DashMap<PathBuf, Arc<Mutex<()>>>,
    path: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table itself is left referencing an idle lock.
        self.locks
            .remove_if(&self.path, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Create `path` and any missing ancestors, then force its mode to
/// [`VOLUME_MODE`] regardless of the process umask.
async fn prepare_volume_dir(path: &Path) -> Result<(), ProvisionError> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true).mode(VOLUME_MODE);
    if let Err(e) = builder.create(path).await {
        let is_dir = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if e.kind() != std::io::ErrorKind::AlreadyExists || !is_dir {
            error!(path = %path.display(), error = %e, "failed to create volume directory");
            return Err(ProvisionError::storage(StorageOp::Create, path, e));
        }
        debug!(path = %path.display(), "volume directory already exists");
    }

    // set_permissions follows symlinks; never chmod a target outside the root.
    let meta = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|e| ProvisionError::storage(StorageOp::Chmod, path, e))?;
    if meta.file_type().is_symlink() {
        error!(path = %path.display(), "volume path is a symlink, refusing to chmod");
        return Err(ProvisionError::storage(
            StorageOp::Chmod,
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "volume path is a symlink"),
        ));
    }

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(VOLUME_MODE))
        .await
        .map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to chmod volume directory");
            ProvisionError::storage(StorageOp::Chmod, path, e)
        })
}

// ---------------------------------------------------------------------------
// ProvisionerIdentity
// ---------------------------------------------------------------------------

#[async_trait]
impl ProvisionerIdentity for HostPathBackend {
    async fn get_plugin_info(&self) -> Result<PluginInfo, ProvisionError> {
        Ok(PluginInfo {
            name: self.config.name.clone(),
            identity: self.config.identity.clone(),
            vendor_version: env!("CARGO_PKG_VERSION").to_owned(),
        })
    }

    async fn probe(&self) -> Result<bool, ProvisionError> {
        let healthy = tokio::fs::metadata(&self.config.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        Ok(healthy)
    }
}

// ---------------------------------------------------------------------------
// Provisioner
// ---------------------------------------------------------------------------

#[async_trait]
impl Provisioner for HostPathBackend {
    #[instrument(skip(self, req), fields(
        namespace = %req.namespace,
        claim = %req.claim_name,
        volume = %req.volume_name
    ))]
    async fn provision(&self, req: ProvisionRequest) -> Result<VolumeDescriptor, ProvisionError> {
        let path = self.volume_path(&req.namespace, &req.claim_name)?;
        if req.volume_name.is_empty() {
            return Err(ProvisionError::invalid("volume name is empty"));
        }
        let reclaim_policy = req
            .reclaim_policy
            .ok_or_else(|| ProvisionError::invalid("reclaim policy not set"))?;

        info!(
            path = %path.display(),
            capacity = %req.capacity,
            access_modes = ?req.access_modes,
            ?reclaim_policy,
            parameters = ?req.parameters,
            "provisioning volume",
        );

        let guard = self.lock_path(&path).await;
        prepare_volume_dir(&path).await?;
        drop(guard);

        info!(path = %path.display(), "volume provisioned");
        Ok(self.descriptor(req, reclaim_policy, path))
    }

    #[instrument(skip(self, volume), fields(volume = %volume.name))]
    async fn delete(&self, volume: &VolumeDescriptor) -> Result<DeleteOutcome, ProvisionError> {
        info!(?volume, "deleting volume");

        let owner = volume
            .identity()
            .ok_or_else(|| ProvisionError::invariant("identity annotation not found on volume"))?;
        if owner != self.config.identity {
            info!(
                owner,
                ours = %self.config.identity,
                "identity annotation does not match ours, leaving volume alone",
            );
            return Ok(DeleteOutcome::DeclinedForeign {
                owner: owner.to_owned(),
            });
        }

        let path = volume
            .host_path
            .as_ref()
            .map(|src| src.path.as_path())
            .ok_or_else(|| ProvisionError::invariant("host path source not found on volume"))?;
        if !is_within_root(&self.config.root, path) {
            return Err(ProvisionError::invariant(format!(
                "host path {} is outside root {}",
                path.display(),
                self.config.root.display()
            )));
        }

        let guard = self.lock_path(path).await;
        let outcome = match tokio::fs::remove_dir_all(path).await {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "volume directory already gone");
                DeleteOutcome::AlreadyAbsent
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to remove volume directory");
                return Err(ProvisionError::storage(StorageOp::Remove, path, e));
            }
        };
        drop(guard);

        info!(path = %path.display(), ?outcome, "volume deleted");
        Ok(outcome)
    }
}
