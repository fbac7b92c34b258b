//! Kubernetes launcher implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Secret;
use kube::Client;
use kube::api::{Api, Patch, PatchParams, PostParams};
use nfkube_core::{Error, LaunchHandle, LaunchSpec, Launcher, Result};
use tracing::{info, warn};

use crate::manifests::{
    SERVICE_ACCOUNT_NAMESPACE, build_job, build_secret, owner_reference, resolve_namespace,
};

/// Submits the head job to a cluster.
///
/// Creates the config secret, then the job, then makes the job the
/// secret's controller so deleting the job removes the secret.
pub struct KubernetesLauncher {
    client: Client,
    service_account_file: PathBuf,
}

impl KubernetesLauncher {
    /// Connect using the in-cluster config or the local kubeconfig.
    pub async fn new() -> Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| Error::Kubernetes(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            service_account_file: PathBuf::from(SERVICE_ACCOUNT_NAMESPACE),
        }
    }
}

#[async_trait]
impl Launcher for KubernetesLauncher {
    fn name(&self) -> &'static str {
        "kubernetes"
    }

    async fn launch(&self, spec: LaunchSpec) -> Result<LaunchHandle> {
        // Reject bad resources before anything is created in the cluster.
        spec.resources.cpu_request()?;

        let namespace = resolve_namespace(spec.namespace.as_deref(), &self.service_account_file);
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        let jobs: Api<Job> = Api::namespaced(self.client.clone(), &namespace);

        let mut secret = build_secret(&spec);
        secret.metadata.namespace = Some(namespace.clone());
        let created_secret = secrets
            .create(&PostParams::default(), &secret)
            .await
            .map_err(|e| Error::Kubernetes(format!("creating config secret: {}", e)))?;
        let secret_name = created_secret
            .metadata
            .name
            .ok_or_else(|| Error::Kubernetes("created secret has no name".to_string()))?;
        info!(namespace = %namespace, secret = %secret_name, "created config secret");

        let mut job = build_job(&spec, &secret_name)?;
        job.metadata.namespace = Some(namespace.clone());
        let created_job = jobs
            .create(&PostParams::default(), &job)
            .await
            .map_err(|e| Error::Kubernetes(format!("creating job '{}': {}", spec.name, e)))?;
        info!(namespace = %namespace, job = %spec.name, "created head job");

        let owner = owner_reference(&created_job)?;
        let patch = serde_json::json!({
            "metadata": { "ownerReferences": [owner] }
        });
        if let Err(e) = secrets
            .patch(&secret_name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            warn!(secret = %secret_name, error = %e, "failed to set secret owner; it will outlive the job");
        }

        Ok(LaunchHandle {
            name: spec.name,
            namespace,
            secret_name,
            launcher_name: self.name().to_string(),
        })
    }
}
