//! hostpathd - host-path volume provisioner entry point.
//!
//! Configuration comes from `PROVISIONER_NAME`, `PROVISIONER_DIR` and
//! `PROVISIONER_ISSUER`; command-line flags override them.  Requests and
//! volume descriptors are exchanged as JSON so the reconciliation controller
//! (or an operator) can drive the provisioner from outside the process.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use libhostpath::{HostPathBackend, ProvisionerConfig};

/// Host-path volume provisioner.
#[derive(Parser, Debug)]
#[command(name = "hostpathd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Provisioner name (overrides PROVISIONER_NAME)
    #[arg(long, global = true)]
    name: Option<String>,

    /// Root directory for volumes (overrides PROVISIONER_DIR)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Identity stamped on created volumes (overrides PROVISIONER_ISSUER)
    #[arg(long, global = true)]
    issuer: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision a volume for the claim described by a JSON request
    Provision {
        /// Request file, `-` for stdin
        #[arg(default_value = "-")]
        request: PathBuf,
    },

    /// Reclaim the volume described by a JSON volume descriptor
    Delete {
        /// Descriptor file, `-` for stdin
        #[arg(default_value = "-")]
        volume: PathBuf,
    },

    /// Check that the storage root is usable
    Probe,

    /// Print provisioner name, identity and version
    Info,
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    fn config(&self, env: ProvisionerConfig) -> ProvisionerConfig {
        ProvisionerConfig {
            name: self.name.clone().unwrap_or(env.name),
            root: self.dir.clone().unwrap_or(env.root),
            identity: self.issuer.clone().unwrap_or(env.identity),
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.config(ProvisionerConfig::from_env());
    let backend = HostPathBackend::new(config)?;

    match cli.command {
        Commands::Provision { request } => commands::provision(&backend, &request).await,
        Commands::Delete { volume } => commands::delete(&backend, &volume).await,
        Commands::Probe => commands::probe(&backend).await,
        Commands::Info => commands::info(&backend).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from([
            "hostpathd",
            "--dir",
            "/srv/volumes",
            "--issuer",
            "node-7",
            "probe",
        ]);
        let config = cli.config(ProvisionerConfig::default());
        assert_eq!(config.root, PathBuf::from("/srv/volumes"));
        assert_eq!(config.identity, "node-7");
        assert_eq!(config.name, "hostpath");
    }

    #[test]
    fn environment_used_without_flags() {
        let cli = Cli::parse_from(["hostpathd", "delete", "vol.json"]);
        let env = ProvisionerConfig {
            name: "example.com/hostpath".into(),
            ..Default::default()
        };
        assert_eq!(cli.config(env.clone()), env);
        assert!(matches!(cli.command, Commands::Delete { volume } if volume == PathBuf::from("vol.json")));
    }

    #[test]
    fn provision_reads_stdin_by_default() {
        let cli = Cli::parse_from(["hostpathd", "provision"]);
        assert!(matches!(cli.command, Commands::Provision { request } if request == PathBuf::from("-")));
    }
}
