//! Provisioner configuration.
//!
//! Read once at startup and never mutated afterwards.
//!
//! Environment variables:
//! - `PROVISIONER_NAME`: name the controller routes claims by. Defaults to `hostpath`.
//! - `PROVISIONER_DIR`: root directory under which volumes are created. Defaults to `/data`.
//! - `PROVISIONER_ISSUER`: identity stamped on every created volume. Defaults to
//!   `hostpath-provisioner`.
//!
//! An empty variable is treated the same as an unset one.

use std::path::{Component, PathBuf};

use crate::error::ProvisionError;

pub const ENV_NAME: &str = "PROVISIONER_NAME";
pub const ENV_DIR: &str = "PROVISIONER_DIR";
pub const ENV_ISSUER: &str = "PROVISIONER_ISSUER";

pub const DEFAULT_NAME: &str = "hostpath";
pub const DEFAULT_DIR: &str = "/data";
pub const DEFAULT_IDENTITY: &str = "hostpath-provisioner";

/// Process-wide provisioner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// Provisioner name used by the controller for claim routing.
    pub name: String,
    /// Root directory for all volume directories.
    pub root: PathBuf,
    /// Identity marker written to, and checked on, every volume.
    pub identity: String,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            root: PathBuf::from(DEFAULT_DIR),
            identity: DEFAULT_IDENTITY.to_owned(),
        }
    }
}

impl ProvisionerConfig {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };
        Self {
            name: get(ENV_NAME, DEFAULT_NAME),
            root: PathBuf::from(get(ENV_DIR, DEFAULT_DIR)),
            identity: get(ENV_ISSUER, DEFAULT_IDENTITY),
        }
    }

    /// Reject configurations the backend cannot operate with.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.name.is_empty() {
            return Err(ProvisionError::Config("provisioner name is empty".into()));
        }
        if self.identity.is_empty() {
            return Err(ProvisionError::Config("identity is empty".into()));
        }
        if !self.root.is_absolute() {
            return Err(ProvisionError::Config(format!(
                "root directory {} is not absolute",
                self.root.display()
            )));
        }
        if self
            .root
            .components()
            .any(|c| c == Component::ParentDir)
        {
            return Err(ProvisionError::Config(format!(
                "root directory {} contains `..` components",
                self.root.display()
            )));
        }
        Ok(())
    }
}
