//! Helm pending-release sweeper.
//!
//! Finds a Helm release stuck in a `pending-*` state beyond an age
//! threshold and either prints or deletes the Secrets Helm uses to track
//! that release's revision state. Intended for CI pipelines and operators
//! cleaning up after interrupted installs and upgrades.

mod age;
mod error;
mod helm;
mod secrets;
mod sweep;
mod timestamp;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::age::Threshold;
use crate::error::SweepError;
use crate::helm::HelmCli;
use crate::secrets::KubeSecretStore;
use crate::sweep::{run_sweep, Action, SweepOptions, SweepOutcome};

/// Clean up the state Secrets of a Helm release stuck in pending-*.
#[derive(Parser)]
#[command(name = "helm-sweep")]
#[command(about = "Print or delete the state Secrets of a Helm release stuck in pending-*")]
#[command(version)]
struct Cli {
    /// Release name
    release: String,

    /// Age threshold: epoch seconds, or a duration like 30m, 12h or 2d
    age: String,

    /// What to do with matched Secrets
    #[arg(value_enum)]
    action: Action,

    /// Namespace override (defaults to the namespace the release reports)
    #[arg(short, long)]
    namespace: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout is reserved for matched Secret
    // names in print mode.
    let filter = if cli.verbose {
        EnvFilter::new("helm_sweep=debug,info")
    } else {
        EnvFilter::new("helm_sweep=info,warn")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let threshold = Threshold::parse(&cli.age)?;

    HelmCli::ensure_available()?;
    let store = KubeSecretStore::connect().await?;

    let opts = SweepOptions {
        release: cli.release,
        threshold,
        action: cli.action,
        namespace: cli.namespace,
    };

    match run_sweep(&HelmCli, &store, &opts).await? {
        SweepOutcome::Swept {
            secrets, failed, ..
        } => {
            if opts.action == Action::Print {
                for name in &secrets {
                    println!("{name}");
                }
            }
            if !failed.is_empty() {
                return Err(SweepError::DeleteFailures(failed.len()).into());
            }
        }
        SweepOutcome::NotPending { .. } | SweepOutcome::BelowThreshold { .. } => {}
    }

    Ok(())
}
