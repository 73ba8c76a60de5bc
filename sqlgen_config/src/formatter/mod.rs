//! Configuration format abstraction.
//!
//! The `Formatter` trait turns the bytes of one resource into zero or more
//! flat property sources. Each formatter declares what file extensions it
//! handles via `provides()` and `extensions()`, and is discovered
//! automatically through the registry.
//!
//! Built-in formatters:
//! - `PropertiesFormatter`: `.properties`
//! - `XmlPropertiesFormatter`: `.xml` (behind `xml` feature)
//! - `YamlFormatter`: `.yml`, `.yaml`

pub mod properties;
pub mod yaml;

#[cfg(feature = "xml")]
pub mod xml;

use crate::error::{Error, Result};
use crate::source::PropertySource;
use std::path::Path;

/// A parser from resource bytes to property sources.
///
/// Each formatter owns the character decoding of its format.
///
/// Formatters are stateless. Returning an empty list means the resource held
/// nothing to load; returning an error aborts the whole resolution.
///
/// # Implementing a Formatter
///
/// ```ignore
/// use sqlgen_config::formatter::{extension_matches, utf8_text, Formatter};
/// use sqlgen_config::{PropertySource, Result};
///
/// struct EnvFileFormatter;
///
/// impl Formatter for EnvFileFormatter {
///     fn provides(&self, identifier: &str) -> bool {
///         extension_matches(identifier, self.extensions())
///     }
///
///     fn extensions(&self) -> &[&str] {
///         &["env"]
///     }
///
///     fn deserialize(&self, name: &str, content: &[u8]) -> Result<Vec<PropertySource>> {
///         let text = utf8_text(self.name(), name, content)?;
///         let pairs = text.lines().filter_map(|l| l.split_once('='));
///         Ok(vec![PropertySource::from_pairs(name, pairs)])
///     }
///
///     fn name(&self) -> &str {
///         "env-file"
///     }
/// }
/// ```
pub trait Formatter: Send + Sync + 'static {
    /// Whether this formatter can handle the given location or file name.
    fn provides(&self, identifier: &str) -> bool;

    /// File extensions this formatter handles (without the leading dot).
    fn extensions(&self) -> &[&str];

    /// Parse the raw `content` into property sources named after `name`.
    fn deserialize(&self, name: &str, content: &[u8]) -> Result<Vec<PropertySource>>;

    /// Human-readable name for error messages.
    fn name(&self) -> &str;
}

/// Check whether an identifier's file extension matches any of the given
/// extensions, ignoring ASCII case.
pub fn extension_matches(identifier: &str, extensions: &[&str]) -> bool {
    let path = Path::new(identifier);
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    extensions
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(ext))
}

/// Borrow `content` as UTF-8, reporting invalid bytes as a parse error of
/// `format` in resource `name`.
pub fn utf8_text<'a>(format: &str, name: &str, content: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(content).map_err(|e| Error::parse(format, name, e))
}

/// Suffix appended to source names when a resource yields several documents.
pub(crate) fn document_name(name: &str, index: usize, total: usize) -> String {
    if total == 1 {
        name.to_string()
    } else {
        format!("{name} (document #{index})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_matches() {
        assert!(extension_matches("db.properties", &["properties"]));
        assert!(extension_matches("file:./config/DB.YML", &["yml", "yaml"]));
        assert!(!extension_matches("db.toml", &["yml", "yaml"]));
        assert!(!extension_matches("no_extension", &["properties"]));
    }

    #[test]
    fn test_utf8_text() {
        assert_eq!(utf8_text("YAML", "a", "héllo".as_bytes()).unwrap(), "héllo");
        let err = utf8_text("YAML", "config [a]", b"caf\xE9").unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
        assert!(err.to_string().contains("config [a]"));
    }

    #[test]
    fn test_document_name() {
        assert_eq!(document_name("config [a]", 0, 1), "config [a]");
        assert_eq!(document_name("config [a]", 1, 2), "config [a] (document #1)");
    }
}
