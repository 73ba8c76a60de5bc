//! The ambient property and profile view a resolution starts from.

use crate::error::Result;
use crate::placeholder;
use crate::source::{EnvSource, PropertySource};
use indexmap::IndexMap;
use std::sync::Arc;

/// Name of the source holding properties set directly on an environment.
pub const EXPLICIT_PROPERTIES_NAME: &str = "explicitProperties";

/// Read-only view of ambient properties and profiles.
///
/// The finder consults it for the override keys of its [`Convention`]
/// (active profiles, config names, locations) and layers its property
/// sources on top of everything loaded from files.
///
/// [`Convention`]: crate::Convention
pub trait Environment {
    /// Get the raw value of `key`, if set.
    fn get_property(&self, key: &str) -> Option<String>;

    fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    /// Resolve `${...}` placeholders in `text` against this environment.
    fn resolve_placeholders(&self, text: &str) -> Result<String> {
        placeholder::resolve(text, |key| self.get_property(key))
    }

    /// Profiles the environment reports as active.
    fn active_profiles(&self) -> Vec<String>;

    /// Profiles used when nothing else is active.
    fn default_profiles(&self) -> Vec<String>;

    /// Sources this environment contributes to the merged view, highest
    /// precedence first. They shadow every file-loaded source.
    fn property_sources(&self) -> Vec<Arc<PropertySource>> {
        Vec::new()
    }
}

/// The default environment: explicit properties over an optional
/// environment-variable snapshot.
///
/// # Examples
///
/// ```
/// use sqlgen_config::{Environment, StandardEnvironment};
///
/// let env = StandardEnvironment::new()
///     .with_property("profiles.active", "dev")
///     .with_active_profiles(["ci"]);
///
/// assert_eq!(env.get_property("profiles.active").as_deref(), Some("dev"));
/// assert_eq!(env.active_profiles(), vec!["ci".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct StandardEnvironment {
    properties: IndexMap<String, String>,
    system: Option<Arc<PropertySource>>,
    active_profiles: Vec<String>,
    default_profiles: Vec<String>,
}

impl Default for StandardEnvironment {
    fn default() -> Self {
        Self {
            properties: IndexMap::new(),
            system: None,
            active_profiles: Vec::new(),
            default_profiles: vec!["default".to_string()],
        }
    }
}

impl StandardEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Layer a snapshot of prefixed environment variables below the
    /// explicit properties.
    pub fn with_env_source(mut self, source: &EnvSource) -> Self {
        self.system = Some(Arc::new(source.load()));
        self
    }

    /// Layer an arbitrary source below the explicit properties.
    pub fn with_system_source(mut self, source: PropertySource) -> Self {
        self.system = Some(Arc::new(source));
        self
    }

    pub fn with_active_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_active_profile(&mut self, profile: impl Into<String>) {
        let profile = profile.into();
        if !self.active_profiles.contains(&profile) {
            self.active_profiles.push(profile);
        }
    }
}

impl Environment for StandardEnvironment {
    fn get_property(&self, key: &str) -> Option<String> {
        self.properties
            .get(key)
            .map(String::as_str)
            .or_else(|| self.system.as_ref().and_then(|s| s.get(key)))
            .map(str::to_string)
    }

    fn active_profiles(&self) -> Vec<String> {
        self.active_profiles.clone()
    }

    fn default_profiles(&self) -> Vec<String> {
        self.default_profiles.clone()
    }

    fn property_sources(&self) -> Vec<Arc<PropertySource>> {
        let mut sources = Vec::new();
        if !self.properties.is_empty() {
            sources.push(Arc::new(PropertySource::new(
                EXPLICIT_PROPERTIES_NAME,
                self.properties.clone(),
            )));
        }
        sources.extend(self.system.iter().cloned());
        sources
    }
}
