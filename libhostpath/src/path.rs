//! On-disk layout helpers.
//!
//! ```text
//! <root>/
//!   <namespace>/
//!     <claim-name>/     # one directory per volume, mode 0777
//! ```

use std::path::{Component, Path, PathBuf};

use crate::error::ProvisionError;

/// Derive the backing directory for a claim: `root/namespace/claim`.
///
/// Pure function of its inputs, so a retried provision for the same claim
/// always lands on the same directory.  Both name components must be a single
/// normal path segment.
pub fn volume_path(root: &Path, namespace: &str, claim: &str) -> Result<PathBuf, ProvisionError> {
    check_segment("namespace", namespace)?;
    check_segment("claim name", claim)?;
    Ok(root.join(namespace).join(claim))
}

fn check_segment(what: &str, value: &str) -> Result<(), ProvisionError> {
    if value.is_empty() {
        return Err(ProvisionError::invalid(format!("{what} is empty")));
    }
    let mut components = Path::new(value).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || value.contains(['/', '\0']) {
        return Err(ProvisionError::invalid(format!(
            "{what} {value:?} is not a single path segment"
        )));
    }
    Ok(())
}

/// Return `true` if `path` lies strictly below `root`, judged lexically.
///
/// Paths with `.` or `..` components are never considered inside.
pub fn is_within_root(root: &Path, path: &Path) -> bool {
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
    {
        return false;
    }
    path != root && path.starts_with(root)
}
