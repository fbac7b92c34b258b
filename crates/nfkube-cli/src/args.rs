//! Nextflow-style launch arguments.
//!
//! Launcher flags use Nextflow's single-dash form (`-head-cpus 2`) and may
//! appear anywhere among the arguments meant for `nextflow run`.

use std::path::PathBuf;

use nfkube_core::RunName;
use thiserror::Error;

pub const DEFAULT_HEAD_IMAGE: &str = "cerit.io/nextflow/nextflow:24.10.5";
pub const DEFAULT_HEAD_CPUS: &str = "1";
pub const DEFAULT_HEAD_MEMORY: &str = "8Gi";
pub const DEFAULT_CONFIG: &str = "nextflow.config";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("missing value for {0}")]
    MissingValue(String),
}

/// Launcher settings plus the arguments forwarded to `nextflow run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    pub name: RunName,
    /// Forwarded to `nextflow run`, including `-name <name>`.
    pub nextflow_args: Vec<String>,
    /// Raw `-v <claim>:<mountPath>` values, in order.
    pub volumes: Vec<String>,
    pub head_image: String,
    pub head_cpus: String,
    pub head_memory: String,
    pub config_path: PathBuf,
}

impl LaunchArgs {
    /// Parse arguments, generating a run name when `-name` is absent.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, ArgsError> {
        Self::parse_with(args, RunName::generate)
    }

    fn parse_with<S, F>(args: &[S], default_name: F) -> Result<Self, ArgsError>
    where
        S: AsRef<str>,
        F: FnOnce() -> RunName,
    {
        let mut name = None;
        let mut volumes = Vec::new();
        let mut head_image = DEFAULT_HEAD_IMAGE.to_string();
        let mut head_cpus = DEFAULT_HEAD_CPUS.to_string();
        let mut head_memory = DEFAULT_HEAD_MEMORY.to_string();
        let mut config_path = PathBuf::from(DEFAULT_CONFIG);
        let mut nextflow_args: Vec<String> = Vec::new();
        let mut first_flag = None;

        let mut iter = args.iter().map(|arg| arg.as_ref());
        while let Some(arg) = iter.next() {
            match arg {
                "-name" => name = Some(take_value(&mut iter, arg)?),
                "-v" => volumes.push(take_value(&mut iter, arg)?),
                "-head-image" | "-pod-image" => head_image = take_value(&mut iter, arg)?,
                "-head-cpus" => head_cpus = take_value(&mut iter, arg)?,
                "-head-memory" => head_memory = take_value(&mut iter, arg)?,
                "-c" => config_path = PathBuf::from(take_value(&mut iter, arg)?),
                "-head-prescript" => {
                    let script = take_value(&mut iter, arg)?;
                    tracing::warn!(script = %script, "-head-prescript is not supported; ignoring");
                }
                flag if flag.starts_with('-') => {
                    first_flag.get_or_insert(nextflow_args.len());
                    nextflow_args.push(flag.to_string());
                }
                "run" | "kuberun" => {}
                word => nextflow_args.push(word.to_string()),
            }
        }

        let name = name.map(RunName::from).unwrap_or_else(default_name);
        let slot = first_flag.unwrap_or(nextflow_args.len());
        nextflow_args.insert(slot, name.to_string());
        nextflow_args.insert(slot, "-name".to_string());

        Ok(Self {
            name,
            nextflow_args,
            volumes,
            head_image,
            head_cpus,
            head_memory,
            config_path,
        })
    }
}

fn take_value<'a>(
    iter: &mut impl Iterator<Item = &'a str>,
    flag: &str,
) -> Result<String, ArgsError> {
    iter.next()
        .map(str::to_string)
        .ok_or_else(|| ArgsError::MissingValue(flag.to_string()))
}
