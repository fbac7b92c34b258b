//! Launch backends for nfkube.
//!
//! Provides launcher implementations for the Nextflow head job:
//! - Kubernetes (submits a Secret and a Job to the cluster)
//! - Dry run (prints the manifests as JSON)

pub mod dry_run;
pub mod kubernetes;
pub mod manifests;

pub use dry_run::DryRunLauncher;
pub use kubernetes::KubernetesLauncher;
pub use nfkube_core::launch::{LaunchHandle, LaunchSpec, Launcher, ResourceRequest};
