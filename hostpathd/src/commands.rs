//! Subcommand handlers.
//!
//! Each handler reads its JSON input, calls the backend, and writes the result
//! as JSON to stdout.  A declined delete exits with [`EXIT_DECLINED`] so the
//! caller can tell "not ours" apart from both success and failure.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use libhostpath::{
    DeleteOutcome, HostPathBackend, ProvisionRequest, Provisioner, ProvisionerIdentity,
    VolumeDescriptor,
};

/// Exit status reported when the volume belongs to another identity.
pub const EXIT_DECLINED: u8 = 3;

/// JSON report printed by `delete`.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
enum DeleteReport {
    Deleted,
    AlreadyAbsent,
    DeclinedForeign { owner: String },
}

impl From<DeleteOutcome> for DeleteReport {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted => Self::Deleted,
            DeleteOutcome::AlreadyAbsent => Self::AlreadyAbsent,
            DeleteOutcome::DeclinedForeign { owner } => Self::DeclinedForeign { owner },
        }
    }
}

fn read_json<T: DeserializeOwned>(source: &Path) -> Result<T> {
    let raw = if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("read {}", source.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parse {}", source.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}

pub async fn provision(backend: &HostPathBackend, source: &Path) -> Result<ExitCode> {
    let req: ProvisionRequest = read_json(source)?;
    let volume = backend.provision(req).await?;
    print_json(&volume)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn delete(backend: &HostPathBackend, source: &Path) -> Result<ExitCode> {
    let volume: VolumeDescriptor = read_json(source)?;
    let outcome = backend.delete(&volume).await?;
    let code = if outcome.is_declined() {
        ExitCode::from(EXIT_DECLINED)
    } else {
        ExitCode::SUCCESS
    };
    print_json(&DeleteReport::from(outcome))?;
    Ok(code)
}

pub async fn probe(backend: &HostPathBackend) -> Result<ExitCode> {
    let root = backend.config().root.display().to_string();
    if backend.probe().await? {
        info!(%root, "storage root is healthy");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(%root, "storage root missing or not a directory");
        Ok(ExitCode::FAILURE)
    }
}

pub async fn info(backend: &HostPathBackend) -> Result<ExitCode> {
    print_json(&backend.get_plugin_info().await?)?;
    Ok(ExitCode::SUCCESS)
}
