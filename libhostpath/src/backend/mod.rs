//! Storage backend implementations.
//!
//! Each backend module provides a concrete type that implements
//! [`ProvisionerIdentity`](crate::identity::ProvisionerIdentity) and
//! [`Provisioner`](crate::controller::Provisioner).

pub mod hostpath;
