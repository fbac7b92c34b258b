//! Loading and preparing a Nextflow config file.
//!
//! Each stage takes the config by value and hands back a new one:
//! `load_config` → `apply_volume_args` → `resolve` → `render`.
//!
//! Volume arguments go in before resolution so that placeholders such as
//! `${k8s.storageMountPath}` see the storage chosen on the command line.

use std::path::Path;

use nfkube_core::VolumeRecord;

use crate::assignments::parse_block;
use crate::extract::extract_block;
use crate::mapping::ConfigMapping;
use crate::render::{render_block_with, render_document};
use crate::resolve::resolve_references;
use crate::volumes::{apply_volume_args, collect_volumes};
use crate::warning::ConfigWarning;
use crate::ConfigResult;

/// Name of the block holding the Kubernetes settings.
pub const DEFAULT_BLOCK: &str = "k8s";

/// A parsed config file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub block_name: String,
    pub mapping: ConfigMapping,
    /// Lines of nested sub-blocks inside the block, carried through as is.
    pub nested: Vec<String>,
    /// Raw lines before the block.
    pub preamble: Vec<String>,
    /// Raw lines after the block.
    pub remainder: Vec<String>,
    /// Every non-fatal problem met so far.
    pub warnings: Vec<ConfigWarning>,
}

/// Read `path` and parse its `block_name` block.
pub fn load_config(path: impl AsRef<Path>, block_name: &str) -> ConfigResult<LoadedConfig> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading config");
    let text = std::fs::read_to_string(path)?;
    load_config_str(&text, block_name)
}

/// Parse the `block_name` block out of in-memory config text.
pub fn load_config_str(text: &str, block_name: &str) -> ConfigResult<LoadedConfig> {
    let lines: Vec<&str> = text.lines().collect();
    let extracted = extract_block(&lines, block_name)?;
    let parsed = parse_block(&extracted.block);
    let mapping = parsed.mapping;

    let mut warnings = extracted.warnings;
    warnings.extend(parsed.warnings);
    for warning in &warnings {
        warning.emit();
    }

    tracing::info!(block = block_name, keys = mapping.len(), "loaded config block");
    Ok(LoadedConfig {
        block_name: block_name.to_string(),
        mapping,
        nested: parsed.nested,
        preamble: extracted.preamble,
        remainder: extracted.remainder,
        warnings,
    })
}

impl LoadedConfig {
    /// Substitute `${<block>.key}` placeholders.
    pub fn resolve(self) -> ConfigResult<Self> {
        let mapping = resolve_references(self.mapping, &self.block_name)?;
        Ok(Self { mapping, ..self })
    }

    /// Apply `-v <claim>:<mountPath>` arguments. Call before `resolve`.
    pub fn apply_volume_args<S: AsRef<str>>(self, args: &[S]) -> Self {
        let (mapping, new_warnings) = apply_volume_args(self.mapping, args);
        for warning in &new_warnings {
            warning.emit();
        }
        let mut warnings = self.warnings;
        warnings.extend(new_warnings);
        Self {
            mapping,
            warnings,
            ..self
        }
    }

    /// Volumes to mount into the head job.
    pub fn volumes(&self) -> Vec<VolumeRecord> {
        collect_volumes(&self.mapping)
    }

    /// The final config text delivered to the head job.
    pub fn render(&self) -> String {
        let block = render_block_with(&self.block_name, &self.mapping, &self.nested);
        render_document(&self.preamble, &block, &self.remainder)
    }
}
