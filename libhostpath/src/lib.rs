//! # libhostpath — host-path volume provisioning
//!
//! `libhostpath` holds the storage-side logic of a dynamic volume provisioner
//! that backs every claim with a plain directory on the local filesystem.  An
//! external reconciliation controller watches claims and calls into the
//! [`Provisioner`] trait; this crate decides where the directory lives,
//! prepares it idempotently, builds the volume object, and checks ownership
//! before anything is deleted.  It follows the RK8s conventions (Tokio async
//! runtime, `tracing` for observability, `thiserror` for structured errors).
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Data model: `ProvisionRequest`, `VolumeDescriptor`, outcomes. |
//! | [`error`] | [`ProvisionError`] enum covering all failure modes. |
//! | [`config`] | [`ProvisionerConfig`] read once from the environment. |
//! | [`path`] | On-disk layout: `root/namespace/claim`. |
//! | [`identity`] | [`ProvisionerIdentity`] trait — discovery & health. |
//! | [`controller`] | [`Provisioner`] trait — provision / delete. |
//! | [`backend`] | Storage backends (host path). |

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod path;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use backend::hostpath::HostPathBackend;
pub use config::ProvisionerConfig;
pub use controller::Provisioner;
pub use error::{ProvisionError, StorageOp};
pub use identity::ProvisionerIdentity;
pub use types::*;
