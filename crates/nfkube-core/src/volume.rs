//! Persistent volume claim records.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A persistent volume claim mounted into the head job.
///
/// Two records are equal when both the claim and the mount path match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{claim_name}:{mount_path}")]
pub struct VolumeRecord {
    /// Name of the PersistentVolumeClaim.
    pub claim_name: String,
    /// Path inside the container.
    pub mount_path: String,
}

impl VolumeRecord {
    pub fn new(claim_name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            claim_name: claim_name.into(),
            mount_path: mount_path.into(),
        }
    }

    /// Render the record body as it appears inside a `pod` list literal,
    /// without the surrounding brackets.
    pub fn to_entry(&self) -> String {
        format!(
            "volumeClaim:'{}', mountPath:'{}'",
            self.claim_name, self.mount_path
        )
    }
}

impl std::str::FromStr for VolumeRecord {
    type Err = Error;

    /// Parse a `claim:path` command line argument.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [claim, path] if !claim.is_empty() && !path.is_empty() => {
                Ok(Self::new(*claim, *path))
            }
            _ => Err(Error::InvalidInput(format!(
                "volume must be <claim>:<mountPath>, got '{}'",
                s
            ))),
        }
    }
}
