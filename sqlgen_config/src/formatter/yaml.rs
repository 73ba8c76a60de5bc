//! YAML format support.

use crate::error::{Error, Result};
use crate::formatter::{document_name, extension_matches, utf8_text, Formatter};
use crate::registry::RegisteredFormatter;
use crate::source::PropertySource;
use indexmap::IndexMap;
use yaml_rust2::Yaml;

inventory::submit! { RegisteredFormatter::new(2, &YamlFormatter) }

/// Formatter for YAML files.
///
/// Uses the `yaml-rust2` crate (no serde dependency). Every non-empty
/// document of a `---` separated stream becomes its own source, flattened
/// to dotted keys with `[i]` list indices. Scalars are kept as text.
pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn provides(&self, identifier: &str) -> bool {
        extension_matches(identifier, self.extensions())
    }

    fn extensions(&self) -> &[&str] {
        &["yml", "yaml"]
    }

    fn deserialize(&self, name: &str, content: &[u8]) -> Result<Vec<PropertySource>> {
        use yaml_rust2::YamlLoader;

        let text = utf8_text("YAML", name, content)?;
        let docs = YamlLoader::load_from_str(text)
            .map_err(|e| Error::parse("YAML", name, e.to_string()))?;

        let flattened: Vec<IndexMap<String, String>> = docs
            .into_iter()
            .filter(|doc| !matches!(doc, Yaml::Null | Yaml::BadValue))
            .map(flatten_document)
            .collect();

        let total = flattened.len();
        Ok(flattened
            .into_iter()
            .enumerate()
            .map(|(i, properties)| PropertySource::new(document_name(name, i, total), properties))
            .collect())
    }

    fn name(&self) -> &str {
        "yaml"
    }
}

fn flatten_document(doc: Yaml) -> IndexMap<String, String> {
    let mut result = IndexMap::new();
    match doc {
        Yaml::Hash(map) => flatten_map(&mut result, "", map),
        other => flatten_value(&mut result, "document".to_string(), other),
    }
    result
}

fn flatten_map(result: &mut IndexMap<String, String>, prefix: &str, map: yaml_rust2::yaml::Hash) {
    for (key, value) in map {
        let Some(key) = key_text(key) else {
            continue;
        };
        let path = if prefix.is_empty() {
            key
        } else if key.starts_with('[') {
            format!("{prefix}{key}")
        } else {
            format!("{prefix}.{key}")
        };
        flatten_value(result, path, value);
    }
}

fn flatten_value(result: &mut IndexMap<String, String>, path: String, value: Yaml) {
    match value {
        Yaml::Hash(map) => flatten_map(result, &path, map),
        Yaml::Array(items) if items.is_empty() => {
            result.insert(path, String::new());
        }
        Yaml::Array(items) => {
            for (i, item) in items.into_iter().enumerate() {
                flatten_value(result, format!("{path}[{i}]"), item);
            }
        }
        scalar => {
            result.insert(path, scalar_text(scalar));
        }
    }
}

/// String keys are used as-is; other scalar keys are bracketed.
fn key_text(key: Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s),
        Yaml::Integer(_) | Yaml::Real(_) | Yaml::Boolean(_) => Some(format!("[{}]", scalar_text(key))),
        _ => None,
    }
}

fn scalar_text(value: Yaml) -> String {
    match value {
        Yaml::String(s) | Yaml::Real(s) => s,
        Yaml::Integer(i) => i.to_string(),
        Yaml::Boolean(b) => b.to_string(),
        _ => String::new(),
    }
}
