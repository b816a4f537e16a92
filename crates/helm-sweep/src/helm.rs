//! Release inspection through the Helm CLI.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Command;
use tracing::debug;

use crate::error::SweepError;

/// Snapshot of a release as reported by `helm status`, read once per run
/// and treated as immutable afterwards.
#[derive(Debug, Clone)]
pub struct ReleaseStatus {
    pub name: String,
    /// Free-form status string; stuck releases carry a `pending-` prefix
    /// (`pending-install`, `pending-upgrade`, `pending-rollback`).
    pub status: String,
    /// Raw last-deployed timestamp, RFC 3339.
    pub last_deployed: String,
    pub namespace: String,
    pub revision: i64,
}

impl ReleaseStatus {
    /// Whether the release is in one of Helm's non-terminal pending states.
    pub fn is_pending(&self) -> bool {
        self.status.starts_with("pending")
    }
}

/// Injectable release status source so the sweep logic can be tested
/// without a cluster or a helm binary.
#[async_trait]
pub trait ReleaseQuery {
    async fn release_status(
        &self,
        release: &str,
        namespace: Option<&str>,
    ) -> Result<ReleaseStatus, SweepError>;
}

#[derive(Deserialize)]
struct HelmStatusDoc {
    name: String,
    namespace: String,
    version: i64,
    info: HelmStatusInfo,
}

#[derive(Deserialize)]
struct HelmStatusInfo {
    status: String,
    last_deployed: String,
}

fn parse_status_doc(release: &str, stdout: &[u8]) -> Result<ReleaseStatus, SweepError> {
    let doc: HelmStatusDoc =
        serde_json::from_slice(stdout).map_err(|e| SweepError::Query {
            release: release.to_string(),
            reason: format!("undecodable status document: {e}"),
        })?;

    Ok(ReleaseStatus {
        name: doc.name,
        status: doc.info.status,
        last_deployed: doc.info.last_deployed,
        namespace: doc.namespace,
        revision: doc.version,
    })
}

/// Queries release state by shelling out to `helm status -o json`.
pub struct HelmCli;

impl HelmCli {
    /// Probe for the helm binary before touching the cluster.
    pub fn ensure_available() -> Result<(), SweepError> {
        let probe = Command::new("helm")
            .args(["version", "--short"])
            .output()
            .map_err(|e| SweepError::Environment(format!("helm not found on PATH: {e}")))?;

        if !probe.status.success() {
            let stderr = String::from_utf8_lossy(&probe.stderr);
            return Err(SweepError::Environment(format!(
                "helm version probe failed: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ReleaseQuery for HelmCli {
    async fn release_status(
        &self,
        release: &str,
        namespace: Option<&str>,
    ) -> Result<ReleaseStatus, SweepError> {
        let mut cmd = Command::new("helm");
        cmd.args(["status", release, "-o", "json"]);
        if let Some(ns) = namespace {
            cmd.args(["-n", ns]);
        }

        debug!(release, ?namespace, "querying helm status");
        let output = cmd.output().map_err(|e| SweepError::Query {
            release: release.to_string(),
            reason: format!("failed to run helm: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SweepError::Query {
                release: release.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(SweepError::Query {
                release: release.to_string(),
                reason: "helm returned no status document".to_string(),
            });
        }

        parse_status_doc(release, &output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_helm_status_document() {
        let doc = br#"{
            "name": "my-app",
            "info": {
                "first_deployed": "2023-01-01T00:00:00.000000001Z",
                "last_deployed": "2023-06-15T10:20:30.123456789Z",
                "status": "pending-upgrade",
                "description": "Preparing upgrade"
            },
            "version": 7,
            "namespace": "prod"
        }"#;

        let status = parse_status_doc("my-app", doc).unwrap();
        assert_eq!(status.name, "my-app");
        assert_eq!(status.status, "pending-upgrade");
        assert_eq!(status.last_deployed, "2023-06-15T10:20:30.123456789Z");
        assert_eq!(status.namespace, "prod");
        assert_eq!(status.revision, 7);
        assert!(status.is_pending());
    }

    #[test]
    fn undecodable_document_names_the_release() {
        let err = parse_status_doc("my-app", b"Error: release not found").unwrap_err();
        assert!(err.to_string().contains("my-app"));
    }

    #[test]
    fn pending_prefix_matching() {
        let mut status = ReleaseStatus {
            name: "r".into(),
            status: "pending-install".into(),
            last_deployed: String::new(),
            namespace: "default".into(),
            revision: 1,
        };
        assert!(status.is_pending());

        status.status = "deployed".into();
        assert!(!status.is_pending());

        status.status = "failed".into();
        assert!(!status.is_pending());
    }
}
