//! Access to the Secrets Helm uses to persist release revision state.
//!
//! Helm's Secret storage driver labels each revision Secret with
//! `owner=helm`, `name=<release>` and `version=<revision>`, which is what
//! the sweep selects on.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, DeleteParams, ListParams};
use kube::Client;
use tracing::debug;

use crate::error::SweepError;

/// Result of a single Secret deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The Secret was already absent; deletion is idempotent so this is
    /// success.
    AlreadyGone,
}

/// Injectable Secret list/delete interface.
#[async_trait]
pub trait SecretStore {
    /// List the names of the release-state Secrets for one revision, in
    /// the order the API returns them.
    async fn list_release_secrets(
        &self,
        namespace: &str,
        release: &str,
        revision: i64,
    ) -> Result<Vec<String>, SweepError>;

    /// Delete one Secret by name.
    async fn delete_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DeleteOutcome, SweepError>;
}

/// Production store backed by the cluster's Secret API.
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    /// Connect using the ambient kubeconfig or in-cluster service account.
    pub async fn connect() -> Result<Self, SweepError> {
        let client = Client::try_default().await.map_err(|e| {
            SweepError::Environment(format!("failed to initialize kubernetes client: {e}"))
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn list_release_secrets(
        &self,
        namespace: &str,
        release: &str,
        revision: i64,
    ) -> Result<Vec<String>, SweepError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let selector = format!("owner=helm,name={release},version={revision}");

        debug!(namespace, %selector, "listing release state secrets");
        let list = secrets.list(&ListParams::default().labels(&selector)).await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|s| s.metadata.name)
            .collect())
    }

    async fn delete_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DeleteOutcome, SweepError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        match secrets.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(DeleteOutcome::AlreadyGone),
            Err(e) => Err(e.into()),
        }
    }
}
