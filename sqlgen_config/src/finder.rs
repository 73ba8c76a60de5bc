//! The resolution engine.
//!
//! A [`ConfigFinder`] is immutable and may be shared; every call to
//! [`ConfigFinder::find`] builds a fresh [`Resolver`] holding the profile
//! queue, the documents cache and the merge store for that one resolution.
//!
//! One resolution runs a pass per queued profile (the "no profile" sentinel
//! first), then a final pass that picks up profile-restricted sections of
//! plain files. Each pass walks search locations, search names and
//! extensions, probing profile-specific file names after plain ones so that
//! later merges win.

use crate::builder::ConfigFinderBuilder;
use crate::cache::{DocumentsCache, DocumentsCacheKey};
use crate::candidate::{self, ConnectorTemplate, DbConfig};
use crate::convention::Convention;
use crate::discovery::{self, comma_list};
use crate::document::{Document, DocumentFilter};
use crate::environment::Environment;
use crate::error::Result;
use crate::formatter::Formatter;
use crate::loader::{Resource, ResourceLoader};
use crate::merge::{MergeStore, MergedProperties};
use crate::profiles::{Profile, ProfileTracker};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Resolves database connection settings from layered configuration files.
///
/// # Examples
///
/// ```no_run
/// use sqlgen_config::{ConfigFinder, Convention, StandardEnvironment};
///
/// fn main() -> sqlgen_config::Result<()> {
///     let finder = ConfigFinder::builder()
///         .convention(Convention::spring_boot())
///         .connector("hikari")
///         .build()?;
///
///     let env = StandardEnvironment::new().with_active_profiles(["dev"]);
///     match finder.find(&env)? {
///         Some(config) => println!("connecting to {}", config.url()),
///         None => println!("no database configuration found"),
///     }
///     Ok(())
/// }
/// ```
pub struct ConfigFinder {
    pub(crate) convention: Convention,
    pub(crate) search_names: Option<Vec<String>>,
    pub(crate) search_locations: Option<Vec<String>>,
    pub(crate) formatters: Vec<&'static dyn Formatter>,
    pub(crate) resource_loader: Box<dyn ResourceLoader>,
    pub(crate) templates: Vec<ConnectorTemplate>,
    pub(crate) connectors: BTreeSet<String>,
}

/// Everything one resolution produced.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub properties: MergedProperties,
    pub config: Option<DbConfig>,
}

impl ConfigFinder {
    pub fn builder() -> ConfigFinderBuilder {
        ConfigFinderBuilder::new()
    }

    /// A finder for `convention` with the registered formatters and the
    /// file-system loader.
    pub fn new(convention: Convention) -> Result<Self> {
        ConfigFinderBuilder::new().convention(convention).build()
    }

    /// Resolve the connection settings; `Ok(None)` when no template matches.
    pub fn find(&self, env: &dyn Environment) -> Result<Option<DbConfig>> {
        Ok(self.resolve_detailed(env)?.config)
    }

    /// Resolve and also return the merged view the settings came from.
    pub fn resolve_detailed(&self, env: &dyn Environment) -> Result<Resolution> {
        let properties = self.load_properties(env)?;
        let config = candidate::select(&self.templates, &self.connectors, &properties)?;
        if config.is_none() {
            tracing::debug!("No connector template resolved to a complete configuration");
        }
        Ok(Resolution { properties, config })
    }

    /// Load and merge every eligible document without selecting a template.
    pub fn load_properties(&self, env: &dyn Environment) -> Result<MergedProperties> {
        let mut resolver = Resolver::new(self, env)?;
        resolver.run()?;
        Ok(resolver.store.into_merged(env.property_sources()))
    }

    pub fn convention(&self) -> &Convention {
        &self.convention
    }

    pub fn templates(&self) -> &[ConnectorTemplate] {
        &self.templates
    }

    pub fn formatters(&self) -> &[&'static dyn Formatter] {
        &self.formatters
    }
}

impl std::fmt::Debug for ConfigFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigFinder")
            .field("convention", &self.convention)
            .field("search_names", &self.search_names)
            .field("search_locations", &self.search_locations)
            .field(
                "formatters",
                &self.formatters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .field("resource_loader", &self.resource_loader.name())
            .field("templates", &self.templates)
            .field("connectors", &self.connectors)
            .finish()
    }
}

/// Which kind of pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Profile,
    Final,
}

impl Pass {
    fn filter(self, profile: &Profile) -> DocumentFilter {
        match self {
            Pass::Profile => DocumentFilter::Positive(profile.clone()),
            Pass::Final => DocumentFilter::Negative,
        }
    }
}

/// State of one resolution.
struct Resolver<'a> {
    finder: &'a ConfigFinder,
    locations: Vec<String>,
    names: Vec<String>,
    /// Extensions in lookup order, with the index of the formatter reading them.
    extensions: Vec<(&'static str, usize)>,
    tracker: ProfileTracker,
    cache: DocumentsCache,
    store: MergeStore,
}

impl<'a> Resolver<'a> {
    fn new(finder: &'a ConfigFinder, env: &dyn Environment) -> Result<Self> {
        let convention = &finder.convention;
        let locations =
            discovery::search_locations(env, convention, finder.search_locations.as_deref())?;
        let names = discovery::search_names(env, convention, finder.search_names.as_deref())?;

        let mut extensions: Vec<(&'static str, usize)> = Vec::new();
        for (index, formatter) in finder.formatters.iter().enumerate() {
            for &extension in formatter.extensions() {
                if !extensions.iter().any(|(e, _)| *e == extension) {
                    extensions.push((extension, index));
                }
            }
        }
        // First registered format wins, so it is tried last.
        extensions.reverse();

        let activated = profile_list(env, &convention.active_profiles_key)?;
        let included = profile_list(env, &convention.include_profiles_key)?;
        let mut tracker = ProfileTracker::new();
        tracker.initialize(
            &env.active_profiles(),
            &env.default_profiles(),
            &activated,
            &included,
        );

        tracing::debug!(?locations, ?names, "Resolving configuration");
        Ok(Self {
            finder,
            locations,
            names,
            extensions,
            tracker,
            cache: DocumentsCache::new(),
            store: MergeStore::new(),
        })
    }

    fn run(&mut self) -> Result<()> {
        while let Some(profile) = self.tracker.poll() {
            self.store.open_bucket(&profile);
            self.load_pass(&profile, Pass::Profile)?;
            self.tracker.mark_processed(profile);
        }
        self.load_pass(&None, Pass::Final)
    }

    fn load_pass(&mut self, profile: &Profile, pass: Pass) -> Result<()> {
        let locations = self.locations.clone();
        let names = self.names.clone();
        for location in &locations {
            if location.ends_with('/') {
                for name in &names {
                    self.load_name(location, name, profile, pass)?;
                }
            } else {
                self.load_name(location, "", profile, pass)?;
            }
        }
        Ok(())
    }

    fn load_name(&mut self, location: &str, name: &str, profile: &Profile, pass: Pass) -> Result<()> {
        if name.is_empty() {
            let matching = self
                .finder
                .formatters
                .iter()
                .position(|formatter| formatter.provides(location));
            if let Some(index) = matching {
                return self.load(index, location, profile, &pass.filter(profile), pass);
            }
        }
        let prefix = format!("{location}{name}");
        let extensions = self.extensions.clone();
        for (extension, index) in extensions {
            self.load_for_extension(index, &prefix, extension, profile, pass)?;
        }
        Ok(())
    }

    fn load_for_extension(
        &mut self,
        index: usize,
        prefix: &str,
        extension: &str,
        profile: &Profile,
        pass: Pass,
    ) -> Result<()> {
        let profile_filter = pass.filter(profile);
        self.load(index, &format!("{prefix}.{extension}"), profile, &profile_filter, pass)?;

        let Some(current) = profile else {
            return Ok(());
        };
        // Sections for this profile inside files of profiles already processed,
        // latest first so that the earliest processed file is merged last.
        let processed: Vec<String> = self.tracker.processed_names().map(str::to_string).collect();
        for previous in processed.iter().rev() {
            let location = format!("{prefix}-{previous}.{extension}");
            self.load(index, &location, profile, &profile_filter, pass)?;
        }
        let location = format!("{prefix}-{current}.{extension}");
        self.load(index, &location, profile, &profile_filter, pass)?;
        self.load(index, &location, profile, &pass.filter(&None), pass)
    }

    fn load(
        &mut self,
        index: usize,
        location: &str,
        profile: &Profile,
        filter: &DocumentFilter,
        pass: Pass,
    ) -> Result<()> {
        for resource in discovery::resolve_resources(self.finder.resource_loader.as_ref(), location) {
            if !resource.exists() {
                tracing::trace!(location, profile = ?profile, "Skipped missing config");
                continue;
            }
            if resource.extension().is_none() {
                tracing::trace!(location, profile = ?profile, "Skipped config without extension");
                continue;
            }
            self.load_resource(index, &resource, profile, filter, pass)
                .map_err(|e| e.with_description(describe(location, &resource, profile)))?;
        }
        Ok(())
    }

    fn load_resource(
        &mut self,
        index: usize,
        resource: &Resource,
        profile: &Profile,
        filter: &DocumentFilter,
        pass: Pass,
    ) -> Result<()> {
        let documents = self.load_documents(index, resource)?;
        if documents.is_empty() {
            tracing::trace!(
                location = resource.location(),
                profile = ?profile,
                "Skipped unloaded config"
            );
            return Ok(());
        }

        let mut loaded = Vec::new();
        for document in documents.iter() {
            if filter.matches(document, &self.tracker)? {
                self.post_process(document);
                loaded.push(Arc::clone(document.source()));
            }
        }
        if loaded.is_empty() {
            return Ok(());
        }
        for source in loaded {
            match pass {
                Pass::Profile => self.store.add_last(profile, source),
                Pass::Final => {
                    self.store.add_if_absent(profile, source);
                }
            }
        }
        tracing::debug!(
            uri = %resource.uri(),
            location = resource.location(),
            profile = ?profile,
            "Loaded config file"
        );
        Ok(())
    }

    fn load_documents(&mut self, index: usize, resource: &Resource) -> Result<Arc<[Document]>> {
        let finder = self.finder;
        let formatter = finder.formatters[index];
        let key = DocumentsCacheKey::new(index, resource.identity());
        self.cache.get_or_load(key, || {
            let name = format!("config [{}]", resource.location());
            let content = resource.read()?;
            let sources = formatter.deserialize(&name, &content)?;
            Ok(sources
                .into_iter()
                .map(|source| Document::new(source, &finder.convention))
                .collect())
        })
    }

    fn post_process(&mut self, document: &Document) {
        self.tracker.activate(document.active_profiles());
        self.tracker.include(document.include_profiles());
    }
}

fn profile_list(env: &dyn Environment, key: &str) -> Result<Vec<String>> {
    match env.get_property(key) {
        Some(raw) => Ok(comma_list(&env.resolve_placeholders(&raw)?)),
        None => Ok(Vec::new()),
    }
}

fn describe(location: &str, resource: &Resource, profile: &Profile) -> String {
    let mut description = format!(
        "Failed to load property source from '{}' ({})",
        resource.uri(),
        location
    );
    if let Some(profile) = profile {
        description.push_str(" for profile ");
        description.push_str(profile);
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::StandardEnvironment;
    use crate::error::Error;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn finder(root: &Path) -> ConfigFinder {
        ConfigFinder::builder().base_dir(root).build().unwrap()
    }

    #[test]
    fn test_extension_lookup_order() {
        let dir = TempDir::new().unwrap();
        let finder = finder(dir.path());
        let resolver = Resolver::new(&finder, &StandardEnvironment::new()).unwrap();
        let extensions: Vec<&str> = resolver.extensions.iter().map(|(e, _)| *e).collect();
        assert_eq!(extensions.last(), Some(&"properties"));
        assert!(extensions.contains(&"yml"));
        assert!(extensions.contains(&"yaml"));
    }

    #[test]
    fn test_properties_beat_yaml_for_same_stem() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "db.properties", "url=from-properties\n");
        write(dir.path(), "db.yml", "url: from-yaml\nusername: yaml-user\n");

        let merged = finder(dir.path())
            .load_properties(&StandardEnvironment::new())
            .unwrap();
        assert_eq!(merged.get_raw("url"), Some("from-properties"));
        assert_eq!(merged.get_raw("username"), Some("yaml-user"));
    }

    #[test]
    fn test_later_location_wins() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "db.properties", "url=root\n");
        write(dir.path(), "config/db.properties", "url=config\n");

        let merged = finder(dir.path())
            .load_properties(&StandardEnvironment::new())
            .unwrap();
        assert_eq!(merged.get_raw("url"), Some("config"));
    }

    #[test]
    fn test_source_names() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "db.properties", "url=root\n");

        let merged = finder(dir.path())
            .load_properties(&StandardEnvironment::new().with_property("x", "y"))
            .unwrap();
        let names: Vec<&str> = merged.source_names().collect();
        assert_eq!(names, vec!["explicitProperties", "config [file:./db.properties]"]);
    }

    #[test]
    fn test_no_name_location_uses_matching_formatter() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "custom/conn.yml", "url: custom\n");

        let finder = ConfigFinder::builder()
            .base_dir(dir.path())
            .search_locations(["file:./custom/conn.yml"])
            .build()
            .unwrap();
        let merged = finder.load_properties(&StandardEnvironment::new()).unwrap();
        assert_eq!(merged.get_raw("url"), Some("custom"));
    }

    #[test]
    fn test_parse_error_is_wrapped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "config/db.properties", "url=\\uZZZZ\n");

        let err = finder(dir.path())
            .load_properties(&StandardEnvironment::new())
            .unwrap_err();
        match &err {
            Error::LoadError { description, source } => {
                assert!(description.starts_with("Failed to load property source from 'file://"));
                assert!(description.contains("(file:./config/db.properties)"));
                assert!(matches!(**source, Error::ParseError { .. }));
            }
            other => panic!("expected LoadError, got {other:?}"),
        }
    }

    #[test]
    fn test_describe_includes_profile() {
        let resource = Resource::new("file:./db-dev.yml", "/srv/db-dev.yml");
        let description = describe("file:./db-dev.yml", &resource, &Some("dev".to_string()));
        assert_eq!(
            description,
            "Failed to load property source from 'file:///srv/db-dev.yml' (file:./db-dev.yml) for profile dev"
        );
    }
}
