//! Error types for the sweep pipeline.

use thiserror::Error;

/// Errors produced while inspecting a release or sweeping its state Secrets.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A required external tool or client is unavailable.
    #[error("environment error: {0}")]
    Environment(String),

    /// The release status query failed or returned nothing usable.
    #[error("failed to query release {release}: {reason}")]
    Query { release: String, reason: String },

    /// The age argument is neither an epoch integer nor a valid duration token.
    #[error("invalid age threshold {0:?}: expected epoch seconds or <n><unit> with unit in [smhdw]")]
    Duration(String),

    /// The release's last-deployed timestamp could not be parsed.
    #[error("cannot parse date {0:?}")]
    Timestamp(String),

    /// A Kubernetes API call failed.
    #[error("kubernetes api error: {0}")]
    Cluster(#[from] kube::Error),

    /// One or more Secret deletions failed for a reason other than the
    /// Secret already being gone.
    #[error("{0} secret deletion(s) failed")]
    DeleteFailures(usize),
}
