//! Provisioner identity service trait.
//!
//! Lets callers discover which provisioner they are talking to and check
//! that it can serve requests.

use async_trait::async_trait;

use crate::error::ProvisionError;
use crate::types::PluginInfo;

/// Identity service — discovery and health probing.
#[async_trait]
pub trait ProvisionerIdentity: Send + Sync {
    /// Return the provisioner name, identity marker and version.
    async fn get_plugin_info(&self) -> Result<PluginInfo, ProvisionError>;

    /// Liveness probe.  Returns `true` when the storage root is usable.
    async fn probe(&self) -> Result<bool, ProvisionError>;
}
