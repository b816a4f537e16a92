//! The sweep procedure: inspect a release, decide eligibility, then report
//! or delete its state Secrets.

use chrono::Utc;
use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::age::{is_eligible, Threshold};
use crate::error::SweepError;
use crate::helm::ReleaseQuery;
use crate::secrets::{DeleteOutcome, SecretStore};
use crate::timestamp::parse_timestamp;

/// What to do with matched Secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Report the Secret names without touching them.
    Print,
    /// Delete the Secrets.
    Delete,
}

pub struct SweepOptions {
    pub release: String,
    pub threshold: Threshold,
    pub action: Action,
    /// Namespace override; defaults to the namespace the release reports.
    pub namespace: Option<String>,
}

/// What a run did, so the caller can render output and pick an exit code.
#[derive(Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The release is not in a pending state; nothing was queried or touched.
    NotPending { status: String },
    /// The release is pending but deployed after the cutoff.
    BelowThreshold { last_deployed: i64, cutoff: i64 },
    /// The release matched; `secrets` holds the names in API order.
    Swept {
        secrets: Vec<String>,
        deleted: usize,
        already_gone: usize,
        /// Names whose deletion failed for a reason other than absence.
        failed: Vec<String>,
    },
}

/// Run the full sweep once. The release status is read exactly once and a
/// state change mid-run is not re-checked.
pub async fn run_sweep(
    query: &dyn ReleaseQuery,
    store: &dyn SecretStore,
    opts: &SweepOptions,
) -> Result<SweepOutcome, SweepError> {
    let status = query
        .release_status(&opts.release, opts.namespace.as_deref())
        .await?;
    debug!(
        release = %status.name,
        status = %status.status,
        last_deployed = %status.last_deployed,
        revision = status.revision,
        "fetched release status"
    );

    if !status.is_pending() {
        info!(
            release = %status.name,
            status = %status.status,
            "release is not in a pending state, nothing to sweep"
        );
        return Ok(SweepOutcome::NotPending {
            status: status.status,
        });
    }

    let last_deployed = parse_timestamp(&status.last_deployed)?;
    let cutoff = opts.threshold.resolve(Utc::now().timestamp());

    if !is_eligible(last_deployed, cutoff) {
        info!(
            release = %status.name,
            last_deployed,
            cutoff,
            "age below threshold, leaving release alone"
        );
        return Ok(SweepOutcome::BelowThreshold {
            last_deployed,
            cutoff,
        });
    }

    let namespace = opts
        .namespace
        .clone()
        .unwrap_or_else(|| status.namespace.clone());

    let secrets = store
        .list_release_secrets(&namespace, &status.name, status.revision)
        .await?;

    if secrets.is_empty() {
        info!(release = %status.name, revision = status.revision, "no state secrets found");
        return Ok(SweepOutcome::Swept {
            secrets,
            deleted: 0,
            already_gone: 0,
            failed: Vec::new(),
        });
    }

    let mut deleted = 0;
    let mut already_gone = 0;
    let mut failed = Vec::new();

    if opts.action == Action::Delete {
        for name in &secrets {
            match store.delete_secret(&namespace, name).await {
                Ok(DeleteOutcome::Deleted) => {
                    info!(secret = %name, namespace = %namespace, "deleted release state secret");
                    deleted += 1;
                }
                Ok(DeleteOutcome::AlreadyGone) => {
                    debug!(secret = %name, "secret already gone");
                    already_gone += 1;
                }
                Err(e) => {
                    warn!(secret = %name, error = %e, "failed to delete secret, continuing");
                    failed.push(name.clone());
                }
            }
        }
    }

    Ok(SweepOutcome::Swept {
        secrets,
        deleted,
        already_gone,
        failed,
    })
}
