//! Flat, named property sources.
//!
//! A `PropertySource` is the unit every format loader produces and the merge
//! store layers: an insertion-ordered map of dotted/bracketed keys to string
//! values. Sources are immutable once built and shared through `Arc`.

use indexmap::IndexMap;
use std::collections::HashMap;

/// A named, insertion-ordered mapping of flattened keys to values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    name: String,
    properties: IndexMap<String, String>,
}

impl PropertySource {
    /// Create a new property source.
    pub fn new(name: impl Into<String>, properties: IndexMap<String, String>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Build a source from key/value pairs, later pairs replacing earlier ones.
    pub fn from_pairs<K, V, I>(name: impl Into<String>, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let properties = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(name, properties)
    }

    /// The name this source is registered under (used for de-duplication).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Build a property source from environment variables.
///
/// Variables are converted to dotted keys using a separator. For example,
/// with prefix "SQLGEN" and separator "__":
/// - `SQLGEN__PROFILES__ACTIVE=dev` becomes `profiles.active=dev`
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    /// Create a new environment source with the given prefix.
    ///
    /// Uses "__" as the default separator for nested keys.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: "__".to_string(),
        }
    }

    /// Create a new environment source with a custom separator.
    pub fn with_separator(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }

    /// Snapshot the current process environment.
    pub fn load(&self) -> PropertySource {
        self.to_property_source(std::env::vars().collect())
    }

    fn to_property_source(&self, vars: HashMap<String, String>) -> PropertySource {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut entries: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let stripped = key.strip_prefix(&prefix_with_sep)?;
                let dotted = stripped
                    .split(&self.separator)
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
                    .join(".");
                Some((dotted, value))
            })
            .collect();
        // HashMap order is arbitrary; keep the view reproducible.
        entries.sort();
        PropertySource::from_pairs(format!("environment [{}]", self.prefix), entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_preserves_order() {
        let source = PropertySource::from_pairs("test", [("b", "2"), ("a", "1"), ("c", "3")]);
        let keys: Vec<&str> = source.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(source.get("a"), Some("1"));
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn test_from_pairs_later_wins() {
        let source = PropertySource::from_pairs("test", [("a", "1"), ("a", "2")]);
        assert_eq!(source.get("a"), Some("2"));
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_env_source_dotted_keys() {
        let source = EnvSource::new("TEST");
        let vars = HashMap::from([
            ("TEST__PROFILES__ACTIVE".to_string(), "dev".to_string()),
            ("TEST__URL".to_string(), "jdbc:h2:mem:test".to_string()),
            ("OTHER__URL".to_string(), "ignored".to_string()),
        ]);

        let result = source.to_property_source(vars);

        assert_eq!(result.get("profiles.active"), Some("dev"));
        assert_eq!(result.get("url"), Some("jdbc:h2:mem:test"));
        assert!(!result.contains("other.url"));
        assert_eq!(result.name(), "environment [TEST]");
    }

    #[test]
    fn test_env_source_custom_separator() {
        let source = EnvSource::with_separator("APP", "_");
        let vars = HashMap::from([("APP_CONFIG_NAME".to_string(), "db".to_string())]);
        let result = source.to_property_source(vars);
        assert_eq!(result.get("config.name"), Some("db"));
    }
}
