//! Volume records in the `pod` list literal.
//!
//! The `pod` key holds a list of flat records written as
//! `[[volumeClaim:'a', mountPath:'/x'],[volumeClaim:'b', mountPath:'/y']]`.
//! Entries that are not volume records (e.g. `[env:'A', value:'b']`) are
//! carried through untouched.

use std::sync::LazyLock;

use nfkube_core::VolumeRecord;
use regex::Regex;

use crate::mapping::{ConfigMapping, keys};
use crate::warning::{ConfigWarning, WarningKind};

static DOUBLE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s*\[").unwrap());
static DOUBLE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\s*\]").unwrap());
static ENTRY_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\s*,\s*\[").unwrap());

static VOLUME_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\[\s*volumeClaim\s*:\s*['"]([^'"]+)['"]\s*,\s*mountPath\s*:\s*['"]([^'"]+)['"]\s*\]"#,
    )
    .unwrap()
});

/// The entries of a `pod` list literal, without their brackets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeList {
    entries: Vec<String>,
}

impl VolumeList {
    /// Parse a list literal. Blank input gives an empty list, and a single
    /// bare record `[k:'v', ...]` is read as a one-entry list.
    pub fn parse(literal: &str) -> Self {
        let normalized = DOUBLE_OPEN.replace_all(literal, "[[");
        let normalized = DOUBLE_CLOSE.replace_all(&normalized, "]]");
        let normalized = ENTRY_SEPARATOR.replace_all(&normalized, "],[");
        let trimmed = normalized.trim();

        let inner = if let Some(inner) = trimmed
            .strip_prefix("[[")
            .and_then(|s| s.strip_suffix("]]"))
        {
            inner
        } else if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            inner
        } else {
            trimmed
        };

        if inner.trim().is_empty() {
            return Self::default();
        }
        Self {
            entries: inner.split("],[").map(str::to_string).collect(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an existing entry already mounts `record`.
    pub fn contains(&self, record: &VolumeRecord) -> bool {
        let claim = format!("volumeClaim:'{}'", record.claim_name);
        let mount = format!("mountPath:'{}'", record.mount_path);
        self.entries.iter().any(|entry| {
            (entry.contains(&claim) && entry.contains(&mount))
                || extract_volume_records(&format!("[{}]", entry)).contains(record)
        })
    }

    /// Append `record` unless it is already present. Returns whether the
    /// list changed.
    pub fn merge(&mut self, record: &VolumeRecord) -> bool {
        if self.contains(record) {
            return false;
        }
        self.entries.push(record.to_entry());
        true
    }

    /// Serialize as `[[e1],[e2]]`.
    pub fn to_literal(&self) -> String {
        if self.entries.is_empty() {
            return "[]".to_string();
        }
        format!("[[{}]]", self.entries.join("],["))
    }
}

/// Every `[volumeClaim:..., mountPath:...]` record in `value`, in order.
pub fn extract_volume_records(value: &str) -> Vec<VolumeRecord> {
    VOLUME_RECORD
        .captures_iter(value)
        .map(|caps| VolumeRecord::new(&caps[1], &caps[2]))
        .collect()
}

/// Apply `-v <claim>:<mountPath>` arguments to the mapping.
///
/// The first valid argument becomes the work storage
/// (`storageClaimName`/`storageMountPath`); the rest are merged into `pod`.
pub fn apply_volume_args<S: AsRef<str>>(
    mut mapping: ConfigMapping,
    args: &[S],
) -> (ConfigMapping, Vec<ConfigWarning>) {
    let mut warnings = Vec::new();
    let mut storage_set = false;

    for arg in args {
        let arg = arg.as_ref();
        let record: VolumeRecord = match arg.parse() {
            Ok(record) => record,
            Err(e) => {
                warnings.push(ConfigWarning::new(
                    WarningKind::InvalidVolumeArg,
                    None,
                    e.to_string(),
                ));
                continue;
            }
        };

        if !storage_set {
            mapping.insert(keys::STORAGE_CLAIM_NAME, format!("'{}'", record.claim_name));
            mapping.insert(keys::STORAGE_MOUNT_PATH, format!("'{}'", record.mount_path));
            storage_set = true;
            tracing::debug!(volume = %record, "using volume as work storage");
            continue;
        }

        let mut list = VolumeList::parse(mapping.pod().unwrap_or_default());
        if list.merge(&record) {
            tracing::debug!(volume = %record, "added volume to pod list");
            mapping.insert(keys::POD, list.to_literal());
        }
    }

    (mapping, warnings)
}

/// All volumes the head job mounts: the work storage first, then each
/// `pod` record, without duplicates.
pub fn collect_volumes(mapping: &ConfigMapping) -> Vec<VolumeRecord> {
    let mut volumes = Vec::new();

    if let (Some(claim), Some(path)) = (mapping.storage_claim_name(), mapping.storage_mount_path()) {
        volumes.push(VolumeRecord::new(claim, path));
    }

    for record in extract_volume_records(mapping.pod().unwrap_or_default()) {
        if !volumes.contains(&record) {
            volumes.push(record);
        }
    }

    volumes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_new_record() {
        let mut list = VolumeList::parse("[[volumeClaim:'pvc2', mountPath:'/data']]");
        assert!(list.merge(&VolumeRecord::new("pvc3", "/mnt/x")));
        assert_eq!(
            list.to_literal(),
            "[[volumeClaim:'pvc2', mountPath:'/data'],[volumeClaim:'pvc3', mountPath:'/mnt/x']]"
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let record = VolumeRecord::new("pvc3", "/mnt/x");
        let mut list = VolumeList::parse("[[volumeClaim:'pvc2', mountPath:'/data']]");
        list.merge(&record);
        let once = list.to_literal();

        assert!(!list.merge(&record));
        assert_eq!(list.to_literal(), once);
    }

    #[test]
    fn test_whitespace_variance_is_normalized() {
        let mut list = VolumeList::parse(
            "[ [volumeClaim:'a', mountPath:'/x'] ,  [volumeClaim:'b', mountPath:'/y'] ]",
        );
        assert_eq!(list.len(), 2);
        assert!(!list.merge(&VolumeRecord::new("b", "/y")));
        assert_eq!(
            list.to_literal(),
            "[[volumeClaim:'a', mountPath:'/x'],[volumeClaim:'b', mountPath:'/y']]"
        );
    }

    #[test]
    fn test_double_quoted_record_counts_as_present() {
        let mut list = VolumeList::parse("[[volumeClaim: \"a\", mountPath: \"/x\"]]");
        assert!(!list.merge(&VolumeRecord::new("a", "/x")));
    }

    #[test]
    fn test_same_claim_different_path_is_new() {
        let mut list = VolumeList::parse("[[volumeClaim:'a', mountPath:'/x']]");
        assert!(list.merge(&VolumeRecord::new("a", "/y")));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_empty_and_single_record_literals() {
        assert!(VolumeList::parse("").is_empty());
        assert!(VolumeList::parse("[]").is_empty());
        assert!(VolumeList::parse("[ ]").is_empty());

        let mut list = VolumeList::parse("[volumeClaim:'a', mountPath:'/x']");
        assert_eq!(list.len(), 1);
        list.merge(&VolumeRecord::new("b", "/y"));
        assert_eq!(
            list.to_literal(),
            "[[volumeClaim:'a', mountPath:'/x'],[volumeClaim:'b', mountPath:'/y']]"
        );
    }

    #[test]
    fn test_merge_into_empty_list() {
        let mut list = VolumeList::default();
        list.merge(&VolumeRecord::new("a", "/x"));
        assert_eq!(list.to_literal(), "[[volumeClaim:'a', mountPath:'/x']]");
    }

    #[test]
    fn test_non_volume_entries_preserved() {
        let mut list = VolumeList::parse("[[env:'FOO', value:'bar'],[volumeClaim:'a', mountPath:'/x']]");
        list.merge(&VolumeRecord::new("b", "/y"));
        assert_eq!(list.entries()[0], "env:'FOO', value:'bar'");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_extract_records_case_insensitive() {
        let records = extract_volume_records(
            "[[VOLUMECLAIM: 'a' , MountPath: \"/x\"], [env:'A', value:'b'], [volumeClaim:'c', mountPath:'/z']]",
        );
        assert_eq!(
            records,
            vec![VolumeRecord::new("a", "/x"), VolumeRecord::new("c", "/z")]
        );
    }

    #[test]
    fn test_apply_volume_args() {
        let mapping: ConfigMapping = [("pod", "[[volumeClaim:'pvc2', mountPath:'/data']]")]
            .into_iter()
            .collect();
        let (mapping, warnings) = apply_volume_args(
            mapping,
            &["work:/work", "bad-arg", "pvc3:/mnt/x", "pvc2:/data"],
        );

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::InvalidVolumeArg);
        assert_eq!(mapping.get("storageClaimName"), Some("'work'"));
        assert_eq!(mapping.get("storageMountPath"), Some("'/work'"));
        assert_eq!(
            mapping.pod(),
            Some("[[volumeClaim:'pvc2', mountPath:'/data'],[volumeClaim:'pvc3', mountPath:'/mnt/x']]")
        );
    }

    #[test]
    fn test_apply_volume_args_without_pod() {
        let (mapping, _) = apply_volume_args(ConfigMapping::new(), &["a:/a", "b:/b"]);
        assert_eq!(mapping.pod(), Some("[[volumeClaim:'b', mountPath:'/b']]"));
    }

    #[test]
    fn test_collect_volumes() {
        let mapping: ConfigMapping = [
            ("storageClaimName", "'work'"),
            ("storageMountPath", "'/work'"),
            (
                "pod",
                "[[volumeClaim:'work', mountPath:'/work'],[volumeClaim:'ref', mountPath:'/ref']]",
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            collect_volumes(&mapping),
            vec![VolumeRecord::new("work", "/work"), VolumeRecord::new("ref", "/ref")]
        );
    }

    #[test]
    fn test_collect_volumes_requires_both_storage_keys() {
        let mapping: ConfigMapping = [("storageClaimName", "'work'")].into_iter().collect();
        assert!(collect_volumes(&mapping).is_empty());
    }
}
