//! Ordered key/value mapping parsed from the config block.

use indexmap::IndexMap;

/// Well-known keys of the `k8s` block.
pub mod keys {
    pub const NAMESPACE: &str = "namespace";
    pub const LAUNCH_DIR: &str = "launchDir";
    pub const WORK_DIR: &str = "workDir";
    pub const PROJECT_DIR: &str = "projectDir";
    pub const POD: &str = "pod";
    pub const STORAGE_CLAIM_NAME: &str = "storageClaimName";
    pub const STORAGE_MOUNT_PATH: &str = "storageMountPath";
}

/// Remove one layer of matching single or double quotes.
pub fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Raw values of the block's top-level assignments, in source order.
///
/// Values are kept exactly as written (quotes, brackets and placeholders
/// included). Re-assigning a key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMapping {
    entries: IndexMap<String, String>,
}

impl ConfigMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value with one layer of surrounding quotes removed.
    pub fn get_stripped(&self, key: &str) -> Option<&str> {
        self.get(key).map(strip_quotes)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn namespace(&self) -> Option<&str> {
        self.non_empty(keys::NAMESPACE)
    }

    pub fn launch_dir(&self) -> Option<&str> {
        self.non_empty(keys::LAUNCH_DIR)
    }

    pub fn work_dir(&self) -> Option<&str> {
        self.non_empty(keys::WORK_DIR)
    }

    pub fn project_dir(&self) -> Option<&str> {
        self.non_empty(keys::PROJECT_DIR)
    }

    /// The raw `pod` list literal.
    pub fn pod(&self) -> Option<&str> {
        self.get(keys::POD)
    }

    pub fn storage_claim_name(&self) -> Option<&str> {
        self.non_empty(keys::STORAGE_CLAIM_NAME)
    }

    pub fn storage_mount_path(&self) -> Option<&str> {
        self.non_empty(keys::STORAGE_MOUNT_PATH)
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get_stripped(key).filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'prod'"), "prod");
        assert_eq!(strip_quotes("\"pvc1\""), "pvc1");
        assert_eq!(strip_quotes("plain"), "plain");
        assert_eq!(strip_quotes("''"), "");
        // Only one layer, and only when the quotes match.
        assert_eq!(strip_quotes("\"'x'\""), "'x'");
        assert_eq!(strip_quotes("'x\""), "'x\"");
        assert_eq!(strip_quotes("'"), "'");
    }

    #[test]
    fn test_last_write_wins_keeps_position() {
        let mut mapping = ConfigMapping::new();
        mapping.insert("a", "1");
        mapping.insert("b", "2");
        assert_eq!(mapping.insert("a", "3"), Some("1".to_string()));

        let pairs: Vec<_> = mapping.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_well_known_accessors() {
        let mapping: ConfigMapping = [
            ("namespace", "'ns1'"),
            ("launchDir", "\"/work/run\""),
            ("storageClaimName", "''"),
        ]
        .into_iter()
        .collect();

        assert_eq!(mapping.namespace(), Some("ns1"));
        assert_eq!(mapping.launch_dir(), Some("/work/run"));
        assert_eq!(mapping.storage_claim_name(), None);
        assert_eq!(mapping.work_dir(), None);
    }
}
