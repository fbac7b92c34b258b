//! Dry-run launcher: prints the manifests instead of submitting them.

use std::path::PathBuf;

use async_trait::async_trait;
use nfkube_core::{Error, LaunchHandle, LaunchSpec, Launcher, Result};

use crate::manifests::{
    CONFIG_SECRET_PREFIX, SERVICE_ACCOUNT_NAMESPACE, build_job, build_secret, resolve_namespace,
};

/// Prints the secret and job that would be created, as pretty JSON.
pub struct DryRunLauncher {
    service_account_file: PathBuf,
}

impl DryRunLauncher {
    pub fn new() -> Self {
        Self {
            service_account_file: PathBuf::from(SERVICE_ACCOUNT_NAMESPACE),
        }
    }

    pub fn with_service_account_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.service_account_file = path.into();
        self
    }

    /// The secret and job JSON documents, separated by a newline.
    ///
    /// The secret has no name yet, so the job references the name prefix.
    pub fn render(&self, spec: &LaunchSpec) -> Result<String> {
        let namespace = resolve_namespace(spec.namespace.as_deref(), &self.service_account_file);

        let mut secret = build_secret(spec);
        secret.metadata.namespace = Some(namespace.clone());
        let mut job = build_job(spec, CONFIG_SECRET_PREFIX)?;
        job.metadata.namespace = Some(namespace);

        let secret = serde_json::to_string_pretty(&secret)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let job =
            serde_json::to_string_pretty(&job).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(format!("{}\n{}", secret, job))
    }
}

impl Default for DryRunLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Launcher for DryRunLauncher {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn launch(&self, spec: LaunchSpec) -> Result<LaunchHandle> {
        println!("{}", self.render(&spec)?);

        Ok(LaunchHandle {
            namespace: resolve_namespace(spec.namespace.as_deref(), &self.service_account_file),
            name: spec.name,
            secret_name: CONFIG_SECRET_PREFIX.to_string(),
            launcher_name: self.name().to_string(),
        })
    }
}
