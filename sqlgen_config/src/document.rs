//! Parsed documents and the filters that decide which ones a pass keeps.

use crate::convention::Convention;
use crate::discovery::comma_list;
use crate::error::Result;
use crate::profiles::{Profile, ProfileTracker};
use crate::source::PropertySource;
use std::sync::Arc;

/// One parsed configuration section plus its profile metadata.
///
/// The metadata is read from the section itself: the document-profiles key
/// restricts it, the active and include keys name profiles it brings in.
#[derive(Debug, Clone)]
pub struct Document {
    source: Arc<PropertySource>,
    profiles: Vec<String>,
    active_profiles: Vec<String>,
    include_profiles: Vec<String>,
}

impl Document {
    pub fn new(source: PropertySource, convention: &Convention) -> Self {
        let profiles = list_property(&source, &convention.document_profiles_key);
        let active_profiles = list_property(&source, &convention.active_profiles_key);
        let include_profiles = list_property(&source, &convention.include_profiles_key);
        Self {
            source: Arc::new(source),
            profiles,
            active_profiles,
            include_profiles,
        }
    }

    pub fn source(&self) -> &Arc<PropertySource> {
        &self.source
    }

    /// Profiles this document is restricted to; empty means unrestricted.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }

    pub fn include_profiles(&self) -> &[String] {
        &self.include_profiles
    }
}

/// Read a comma list, or an indexed list (`key[0]`, `key[1]`, ...) as
/// produced by flattened YAML sequences.
fn list_property(source: &PropertySource, key: &str) -> Vec<String> {
    if let Some(value) = source.get(key) {
        return comma_list(value);
    }
    let mut values = Vec::new();
    for index in 0.. {
        match source.get(&format!("{key}[{index}]")) {
            Some(value) => values.extend(comma_list(value)),
            None => break,
        }
    }
    values
}

/// Which documents a loading pass keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Pass for one profile (or the sentinel).
    Positive(Profile),
    /// Final pass: restricted documents whose restriction is accepted.
    Negative,
}

impl DocumentFilter {
    pub fn matches(&self, document: &Document, tracker: &ProfileTracker) -> Result<bool> {
        match self {
            DocumentFilter::Positive(None) => Ok(document.profiles.is_empty()),
            DocumentFilter::Positive(Some(profile)) => {
                if !document.profiles.contains(profile) {
                    return Ok(false);
                }
                tracker.accepts(&document.profiles)
            }
            DocumentFilter::Negative => {
                if document.profiles.is_empty() {
                    return Ok(false);
                }
                tracker.accepts(&document.profiles)
            }
        }
    }
}
