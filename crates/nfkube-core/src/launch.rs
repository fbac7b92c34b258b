//! Launcher trait and launch types.
//!
//! A launcher turns a fully prepared `LaunchSpec` into a running Nextflow
//! head job (or a printed manifest in dry-run mode).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, RunName, VolumeRecord};

/// Specification for a Nextflow head job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Job name, also passed to Nextflow as `-name`.
    pub name: RunName,
    /// Namespace from the config block. Backends pick a default when unset.
    pub namespace: Option<String>,
    /// Container image for the head job.
    pub image: String,
    /// Arguments appended to `nextflow run`.
    pub nextflow_args: Vec<String>,
    /// CPU and memory of the head job.
    pub resources: ResourceRequest,
    /// Environment variables for the head container, in order.
    pub env: Vec<(String, String)>,
    /// Persistent volume claims to mount.
    pub volumes: Vec<VolumeRecord>,
    /// Directory the head job changes into before running Nextflow.
    pub launch_dir: String,
    /// Rendered `nextflow.config` delivered to the job.
    pub config_text: String,
}

/// Resources for the head container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// CPU limit, e.g. `"2"`.
    pub cpus: String,
    /// Memory limit and request, e.g. `"8Gi"`.
    pub memory: String,
}

impl ResourceRequest {
    pub fn new(cpus: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpus: cpus.into(),
            memory: memory.into(),
        }
    }

    /// CPU request: half the limit, formatted with one decimal.
    pub fn cpu_request(&self) -> Result<String> {
        let cpus: f64 = self.cpus.trim().parse().map_err(|_| {
            Error::InvalidInput(format!("head cpus must be a number, got '{}'", self.cpus))
        })?;
        if cpus <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "head cpus must be positive, got '{}'",
                self.cpus
            )));
        }
        Ok(format!("{:.1}", cpus / 2.0))
    }
}

/// Handle to a launched job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchHandle {
    /// The job name.
    pub name: RunName,
    /// Namespace the job was created in.
    pub namespace: String,
    /// Name of the secret holding the rendered config.
    pub secret_name: String,
    /// Name of the launcher that handled this job.
    pub launcher_name: String,
}

/// Trait for launch backends.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Name of this launcher.
    fn name(&self) -> &'static str;

    /// Submit the head job described by `spec`.
    async fn launch(&self, spec: LaunchSpec) -> Result<LaunchHandle>;
}
