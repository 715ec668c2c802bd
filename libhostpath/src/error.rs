//! Provisioner error types.
//!
//! All failures in `libhostpath` are represented by the [`ProvisionError`]
//! enum, which derives [`thiserror::Error`].  The "volume belongs to someone
//! else" case is deliberately *not* an error: it is reported through
//! [`DeleteOutcome::DeclinedForeign`](crate::types::DeleteOutcome).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Filesystem operation that failed inside a [`ProvisionError::Storage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    /// Creating the volume directory (and its ancestors).
    Create,
    /// Changing the volume directory's permission bits.
    Chmod,
    /// Recursively removing the volume directory.
    Remove,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Chmod => "chmod",
            Self::Remove => "remove",
        })
    }
}

/// Unified error type for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A filesystem operation on a volume directory failed.
    #[error("{op} {}: {source}", path.display())]
    Storage {
        /// Which operation failed.
        op: StorageOp,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A volume descriptor is missing metadata the provisioner relies on.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The caller supplied an invalid request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The provisioner configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ProvisionError {
    /// Create a [`ProvisionError::Storage`] for `op` on `path`.
    pub fn storage(op: StorageOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            op,
            path: path.into(),
            source,
        }
    }

    /// Create a [`ProvisionError::InvariantViolation`] from anything that
    /// implements [`std::fmt::Display`].
    pub fn invariant<E: fmt::Display>(e: E) -> Self {
        Self::InvariantViolation(e.to_string())
    }

    /// Create a [`ProvisionError::InvalidArgument`] from anything that
    /// implements [`std::fmt::Display`].
    pub fn invalid<E: fmt::Display>(e: E) -> Self {
        Self::InvalidArgument(e.to_string())
    }

    /// Whether the external controller may reasonably retry the same call.
    ///
    /// Only filesystem failures are transient; bad input and corrupted
    /// metadata will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_display() {
        let err = ProvisionError::storage(
            StorageOp::Chmod,
            "/data/ns1/pvc-a",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("chmod /data/ns1/pvc-a: "), "{msg}");
        assert!(err.is_retryable());
    }

    #[test]
    fn invariant_not_retryable() {
        let err = ProvisionError::invariant("identity annotation not found");
        assert_eq!(
            err.to_string(),
            "invariant violation: identity annotation not found"
        );
        assert!(!err.is_retryable());
        assert!(!ProvisionError::invalid("empty namespace").is_retryable());
    }

    #[test]
    fn storage_error_keeps_source() {
        use std::error::Error as _;

        let err = ProvisionError::storage(
            StorageOp::Remove,
            "/data/x",
            std::io::Error::other("device busy"),
        );
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "device busy");
    }
}
