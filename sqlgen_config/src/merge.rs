//! Accumulating loaded sources and flattening them into one view.

use crate::error::Result;
use crate::placeholder;
use crate::profiles::Profile;
use crate::source::PropertySource;
use indexmap::IndexMap;
use std::sync::Arc;

/// Loaded sources grouped by the profile pass that produced them.
///
/// Buckets keep the order they were opened in, which is the order profiles
/// were processed. Within and across buckets, later sources win.
#[derive(Debug, Default)]
pub struct MergeStore {
    buckets: IndexMap<Profile, Vec<Arc<PropertySource>>>,
}

impl MergeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a bucket exists for `profile`, fixing its position.
    pub fn open_bucket(&mut self, profile: &Profile) {
        if !self.buckets.contains_key(profile) {
            self.buckets.insert(profile.clone(), Vec::new());
        }
    }

    /// Append `source` to the bucket of `profile`, replacing an earlier
    /// source of the same name in that bucket.
    pub fn add_last(&mut self, profile: &Profile, source: Arc<PropertySource>) {
        self.open_bucket(profile);
        if let Some(bucket) = self.buckets.get_mut(profile) {
            bucket.retain(|existing| existing.name() != source.name());
            bucket.push(source);
        }
    }

    /// Append `source` unless a source of the same name is already present
    /// in any bucket. Returns whether it was added.
    pub fn add_if_absent(&mut self, profile: &Profile, source: Arc<PropertySource>) -> bool {
        if self.contains_source(source.name()) {
            tracing::trace!(source = source.name(), "Source already merged, skipping");
            return false;
        }
        self.add_last(profile, source);
        true
    }

    pub fn contains_source(&self, name: &str) -> bool {
        self.buckets
            .values()
            .flatten()
            .any(|source| source.name() == name)
    }

    /// Sources of one bucket, in merge order.
    pub fn bucket(&self, profile: &Profile) -> &[Arc<PropertySource>] {
        self.buckets.get(profile).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flatten into a view, with `ambient` (highest first) on top.
    pub fn into_merged(self, ambient: Vec<Arc<PropertySource>>) -> MergedProperties {
        let mut loaded: Vec<Arc<PropertySource>> = self.buckets.into_values().flatten().collect();
        loaded.reverse();
        MergedProperties::new(ambient, loaded)
    }
}

/// The final, precedence-ordered property view.
///
/// Lookups consult the ambient sources first, then the loaded sources from
/// most to least specific.
#[derive(Debug, Clone, Default)]
pub struct MergedProperties {
    ambient: Vec<Arc<PropertySource>>,
    loaded: Vec<Arc<PropertySource>>,
}

impl MergedProperties {
    /// Both lists are ordered highest precedence first.
    pub fn new(ambient: Vec<Arc<PropertySource>>, loaded: Vec<Arc<PropertySource>>) -> Self {
        Self { ambient, loaded }
    }

    fn sources(&self) -> impl Iterator<Item = &Arc<PropertySource>> {
        self.ambient.iter().chain(self.loaded.iter())
    }

    /// The raw value of `key`, without placeholder resolution.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.sources().find_map(|source| source.get(key))
    }

    /// The value of `key` with `${...}` placeholders resolved against this view.
    pub fn get_property(&self, key: &str) -> Result<Option<String>> {
        match self.get_raw(key) {
            Some(raw) => self.resolve_placeholders(raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn contains_property(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    pub fn resolve_placeholders(&self, text: &str) -> Result<String> {
        placeholder::resolve(text, |key| self.get_raw(key).map(str::to_string))
    }

    /// Source names, highest precedence first.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources().map(|source| source.name())
    }

    /// File-loaded sources, highest precedence first.
    pub fn loaded_sources(&self) -> &[Arc<PropertySource>] {
        &self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.sources().all(|source| source.is_empty())
    }
}
