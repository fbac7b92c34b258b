//! Launch command.

use std::path::Path;

use anyhow::{Context, Result};
use nfkube_config::{DEFAULT_BLOCK, LoadedConfig, load_config};
use nfkube_core::{LaunchSpec, Launcher, ResourceRequest};
use nfkube_executor::manifests::nextflow_env;
use nfkube_executor::{DryRunLauncher, KubernetesLauncher};
use tracing::info;

use crate::args::LaunchArgs;

/// Prepare the config and submit the head job.
pub async fn run(args: LaunchArgs, dry_run: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
    let spec = prepare(args, &cwd, std::env::vars())?;

    info!(
        job = %spec.name,
        volumes = spec.volumes.len(),
        launch_dir = %spec.launch_dir,
        "prepared head job"
    );

    let launcher: Box<dyn Launcher> = if dry_run {
        Box::new(DryRunLauncher::new())
    } else {
        Box::new(
            KubernetesLauncher::new()
                .await
                .context("Failed to connect to Kubernetes")?,
        )
    };

    let handle = launcher
        .launch(spec)
        .await
        .context("Failed to launch head job")?;

    if dry_run {
        info!(job = %handle.name, namespace = %handle.namespace, "dry run complete");
    } else {
        println!("Kubernetes Job '{}' created successfully.", handle.name);
    }
    Ok(())
}

/// Load the config, apply `-v` volumes, resolve placeholders and render,
/// then assemble the launch spec.
pub fn prepare<I>(args: LaunchArgs, cwd: &Path, env: I) -> Result<LaunchSpec>
where
    I: IntoIterator<Item = (String, String)>,
{
    let config = load_config(&args.config_path, DEFAULT_BLOCK)
        .with_context(|| format!("Failed to load config: {}", args.config_path.display()))?
        .apply_volume_args(args.volumes.as_slice())
        .resolve()
        .with_context(|| format!("Failed to resolve config: {}", args.config_path.display()))?;

    Ok(build_spec(args, &config, cwd, env))
}

fn build_spec<I>(args: LaunchArgs, config: &LoadedConfig, cwd: &Path, env: I) -> LaunchSpec
where
    I: IntoIterator<Item = (String, String)>,
{
    let launch_dir = config
        .mapping
        .launch_dir()
        .map(str::to_string)
        .unwrap_or_else(|| cwd.display().to_string());

    LaunchSpec {
        name: args.name,
        namespace: config.mapping.namespace().map(str::to_string),
        image: args.head_image,
        nextflow_args: args.nextflow_args,
        resources: ResourceRequest::new(args.head_cpus, args.head_memory),
        env: nextflow_env(env),
        volumes: config.volumes(),
        launch_dir,
        config_text: config.render(),
    }
}
