//! Nextflow config handling for nfkube.
//!
//! This crate handles:
//! - Locating the `k8s { ... }` block inside a free-form `nextflow.config`
//! - Parsing its `key = value` assignments, including multi-line lists
//! - Resolving `${k8s.key}` placeholders between keys of the block
//! - Merging volume records into the `pod` list literal
//! - Rendering the final config delivered to the head job

pub mod assignments;
pub mod error;
pub mod extract;
pub mod loader;
pub mod mapping;
pub mod render;
pub mod resolve;
pub mod sanitize;
pub mod volumes;
pub mod warning;

pub use assignments::{ParsedBlock, parse_assignments, parse_block};
pub use error::{ConfigError, ConfigResult};
pub use extract::{ExtractedBlock, RawBlock, extract_block};
pub use loader::{DEFAULT_BLOCK, LoadedConfig, load_config, load_config_str};
pub use mapping::{ConfigMapping, strip_quotes};
pub use render::{render_block, render_block_with, render_config};
pub use resolve::{PlaceholderReference, ReferenceResolver, resolve_references};
pub use volumes::{VolumeList, collect_volumes, extract_volume_records};
pub use warning::{ConfigWarning, WarningKind};
