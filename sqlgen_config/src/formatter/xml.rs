//! XML properties format support.

use crate::error::{Error, Result};
use crate::formatter::{extension_matches, utf8_text, Formatter};
use crate::registry::RegisteredFormatter;
use crate::source::PropertySource;
use indexmap::IndexMap;

inventory::submit! { RegisteredFormatter::new(1, &XmlPropertiesFormatter) }

/// Formatter for XML property files.
///
/// Uses the `roxmltree` crate (no serde dependency). Reads
/// `<entry key="...">value</entry>` children of a `<properties>` root;
/// `<comment>` and unknown elements are ignored.
pub struct XmlPropertiesFormatter;

impl Formatter for XmlPropertiesFormatter {
    fn provides(&self, identifier: &str) -> bool {
        extension_matches(identifier, self.extensions())
    }

    fn extensions(&self) -> &[&str] {
        &["xml"]
    }

    fn deserialize(&self, name: &str, content: &[u8]) -> Result<Vec<PropertySource>> {
        let text = utf8_text("XML", name, content)?;
        // Property files conventionally carry a DOCTYPE line.
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)
            .map_err(|e| Error::parse("XML", name, e.to_string()))?;

        let root = doc.root_element();
        if root.tag_name().name() != "properties" {
            return Err(Error::parse(
                "XML",
                name,
                format!("expected <properties> root, found <{}>", root.tag_name().name()),
            ));
        }

        let mut properties = IndexMap::new();
        for entry in root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "entry")
        {
            let Some(key) = entry.attribute("key") else {
                return Err(Error::parse("XML", name, "<entry> without a key attribute"));
            };
            let value: String = entry
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect();
            properties.insert(key.to_string(), value);
        }

        if properties.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![PropertySource::new(name, properties)])
    }

    fn name(&self) -> &str {
        "xml"
    }
}
