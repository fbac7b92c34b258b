//! Placeholder resolution between keys of one block.
//!
//! A value may contain `${<namespace>.<key>}` placeholders, e.g.
//! `${k8s.storageMountPath}/work`. Each one is replaced by the referenced
//! key's value with one layer of quotes removed.
//!
//! Resolution is a single pass over the original mapping: if the referenced
//! value itself contains placeholders, they are substituted verbatim and
//! not resolved further.

use regex::Regex;

use crate::mapping::{ConfigMapping, strip_quotes};
use crate::{ConfigError, ConfigResult};

/// A placeholder found in the value of `source_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderReference {
    pub source_key: String,
    pub referenced_key: String,
    /// The full placeholder text, e.g. `${k8s.namespace}`.
    pub placeholder: String,
}

/// Resolves `${<namespace>.<key>}` placeholders.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    pattern: Regex,
}

impl ReferenceResolver {
    pub fn new(namespace: &str) -> ConfigResult<Self> {
        let pattern = Regex::new(&format!(
            r"\$\{{{}\.([a-zA-Z0-9_]+)\}}",
            regex::escape(namespace)
        ))?;
        Ok(Self { pattern })
    }

    /// All placeholders in `value`, in order of appearance.
    pub fn find_references(&self, source_key: &str, value: &str) -> Vec<PlaceholderReference> {
        self.pattern
            .captures_iter(value)
            .map(|caps| PlaceholderReference {
                source_key: source_key.to_string(),
                referenced_key: caps[1].to_string(),
                placeholder: caps[0].to_string(),
            })
            .collect()
    }

    /// Substitute every placeholder of every value.
    ///
    /// Fails on the first self-reference or reference to a missing key;
    /// no partially resolved mapping is returned.
    pub fn resolve(&self, mapping: ConfigMapping) -> ConfigResult<ConfigMapping> {
        let mut resolved = ConfigMapping::new();

        for (key, value) in mapping.iter() {
            let mut new_value = value.to_string();

            for reference in self.find_references(key, value) {
                if reference.referenced_key == key {
                    return Err(ConfigError::SelfReference(key.to_string()));
                }
                let target = mapping.get(&reference.referenced_key).ok_or_else(|| {
                    ConfigError::UndefinedReference {
                        key: key.to_string(),
                        reference: reference.referenced_key.clone(),
                    }
                })?;
                new_value = new_value.replace(&reference.placeholder, strip_quotes(target));
            }

            if new_value != value {
                tracing::debug!(key, value = %new_value, "resolved placeholders");
            }
            resolved.insert(key, new_value);
        }

        Ok(resolved)
    }
}

/// Resolve placeholders of `mapping` for the given block namespace.
pub fn resolve_references(mapping: ConfigMapping, namespace: &str) -> ConfigResult<ConfigMapping> {
    ReferenceResolver::new(namespace)?.resolve(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> ConfigMapping {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_basic_substitution() {
        let resolved = resolve_references(
            mapping(&[("namespace", "'prod'"), ("label", "${k8s.namespace}-suffix")]),
            "k8s",
        )
        .unwrap();
        assert_eq!(resolved.get("label"), Some("prod-suffix"));
        assert_eq!(resolved.get("namespace"), Some("'prod'"));
    }

    #[test]
    fn test_multiple_placeholders_in_one_value() {
        let resolved = resolve_references(
            mapping(&[
                ("storageMountPath", "'/mnt'"),
                ("namespace", "\"team\""),
                ("workDir", "'${k8s.storageMountPath}/${k8s.namespace}/${k8s.namespace}'"),
            ]),
            "k8s",
        )
        .unwrap();
        assert_eq!(resolved.get("workDir"), Some("'/mnt/team/team'"));
    }

    #[test]
    fn test_self_reference_fails() {
        let result = resolve_references(
            mapping(&[("storageClaimName", "${k8s.storageClaimName}")]),
            "k8s",
        );
        assert!(matches!(result, Err(ConfigError::SelfReference(key)) if key == "storageClaimName"));
    }

    #[test]
    fn test_self_reference_fails_alongside_other_content() {
        let result = resolve_references(
            mapping(&[("a", "'x'"), ("b", "${k8s.a}/${k8s.b}")]),
            "k8s",
        );
        assert!(matches!(result, Err(ConfigError::SelfReference(key)) if key == "b"));
    }

    #[test]
    fn test_undefined_reference_fails() {
        let result = resolve_references(mapping(&[("workDir", "${k8s.missing}/w")]), "k8s");
        assert!(matches!(
            result,
            Err(ConfigError::UndefinedReference { reference, .. }) if reference == "missing"
        ));
    }

    #[test]
    fn test_resolution_is_not_transitive() {
        let resolved = resolve_references(
            mapping(&[
                ("a", "'root'"),
                ("b", "${k8s.a}/b"),
                ("c", "${k8s.b}/c"),
            ]),
            "k8s",
        )
        .unwrap();
        assert_eq!(resolved.get("b"), Some("root/b"));
        assert_eq!(resolved.get("c"), Some("${k8s.a}/b/c"));
    }

    #[test]
    fn test_other_namespaces_untouched() {
        let resolved = resolve_references(
            mapping(&[("a", "'x'"), ("b", "${params.a} ${env.HOME} $k8s.a")]),
            "k8s",
        )
        .unwrap();
        assert_eq!(resolved.get("b"), Some("${params.a} ${env.HOME} $k8s.a"));
    }

    #[test]
    fn test_namespace_is_escaped() {
        let resolver = ReferenceResolver::new("k.s").unwrap();
        assert!(resolver.find_references("x", "${kxs.a}").is_empty());
        assert_eq!(resolver.find_references("x", "${k.s.a}").len(), 1);
    }

    #[test]
    fn test_find_references() {
        let resolver = ReferenceResolver::new("k8s").unwrap();
        let refs = resolver.find_references("workDir", "${k8s.a}/${k8s.b_2}");
        let keys: Vec<_> = refs.iter().map(|r| r.referenced_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b_2"]);
        assert_eq!(refs[0].placeholder, "${k8s.a}");
        assert_eq!(refs[0].source_key, "workDir");
    }
}
