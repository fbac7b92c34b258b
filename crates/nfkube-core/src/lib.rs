//! Core domain types and traits for nfkube.
//!
//! This crate contains:
//! - Error types shared by every crate
//! - Volume records parsed from the `k8s` config block
//! - The launch specification handed to a launcher backend
//! - The `Launcher` trait
//! - Run name generation

pub mod error;
pub mod launch;
pub mod name;
pub mod volume;

pub use error::{Error, Result};
pub use launch::{LaunchHandle, LaunchSpec, Launcher, ResourceRequest};
pub use name::RunName;
pub use volume::VolumeRecord;
