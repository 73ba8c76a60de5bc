//! Fluent construction of a [`ConfigFinder`].

use crate::candidate::ConnectorTemplate;
use crate::convention::Convention;
use crate::discovery;
use crate::error::Result;
use crate::finder::ConfigFinder;
use crate::formatter::Formatter;
use crate::loader::file::FileResourceLoader;
use crate::loader::ResourceLoader;
use crate::registry;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A builder for creating `ConfigFinder` instances.
///
/// Starts from [`Convention::db`], the registered formatters and a
/// [`FileResourceLoader`] rooted at the working directory.
///
/// # Examples
///
/// ```no_run
/// use sqlgen_config::{ConfigFinderBuilder, ConnectorTemplate, StandardEnvironment};
///
/// fn main() -> sqlgen_config::Result<()> {
///     let finder = ConfigFinderBuilder::new()
///         .base_dir("/srv/app")
///         .search_names(["db", "jdbc"])
///         .add_template(ConnectorTemplate::new(
///             "legacy",
///             "jdbc.url",
///             "jdbc.driver",
///             "jdbc.user",
///             "jdbc.password",
///         ))
///         .build()?;
///
///     let config = finder.find(&StandardEnvironment::new())?;
///     Ok(())
/// }
/// ```
pub struct ConfigFinderBuilder {
    convention: Convention,
    search_names: Option<Vec<String>>,
    search_locations: Option<Vec<String>>,
    formatters: Option<Vec<&'static dyn Formatter>>,
    extra_formatters: Vec<&'static dyn Formatter>,
    resource_loader: Option<Box<dyn ResourceLoader>>,
    base_dir: Option<PathBuf>,
    classpath_roots: Option<Vec<PathBuf>>,
    extra_templates: Vec<ConnectorTemplate>,
    connectors: BTreeSet<String>,
}

impl ConfigFinderBuilder {
    /// Create a builder for the default `db` convention.
    pub fn new() -> Self {
        Self {
            convention: Convention::db(),
            search_names: None,
            search_locations: None,
            formatters: None,
            extra_formatters: Vec::new(),
            resource_loader: None,
            base_dir: None,
            classpath_roots: None,
            extra_templates: Vec::new(),
            connectors: BTreeSet::new(),
        }
    }

    pub fn convention(mut self, convention: Convention) -> Self {
        self.convention = convention;
        self
    }

    /// Replace the convention's search names.
    ///
    /// The config-name key of the environment still takes precedence.
    pub fn search_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the convention's search locations, least specific first.
    ///
    /// The config-location keys of the environment still apply.
    pub fn search_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_locations = Some(locations.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve relative locations against `dir` instead of the working directory.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Directories `classpath:` locations resolve against, in search order.
    pub fn classpath_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.classpath_roots = Some(roots.into_iter().map(Into::into).collect());
        self
    }

    /// Use a custom resource loader. Overrides `base_dir` and `classpath_roots`.
    pub fn resource_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.resource_loader = Some(Box::new(loader));
        self
    }

    /// Use exactly these formatters, first one highest precedence.
    pub fn formatters(mut self, formatters: Vec<&'static dyn Formatter>) -> Self {
        self.formatters = Some(formatters);
        self
    }

    /// Append a formatter after the registered (or configured) ones.
    pub fn add_formatter(mut self, formatter: &'static dyn Formatter) -> Self {
        self.extra_formatters.push(formatter);
        self
    }

    /// Add a connector template, replacing any template of the same name.
    pub fn add_template(mut self, template: ConnectorTemplate) -> Self {
        self.extra_templates.push(template);
        self
    }

    /// Declare a connector available, enabling templates that require it.
    pub fn connector(mut self, connector: impl Into<String>) -> Self {
        self.connectors.insert(connector.into());
        self
    }

    pub fn connectors<I, S>(mut self, connectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connectors
            .extend(connectors.into_iter().map(Into::into));
        self
    }

    /// Validate the configuration and create the finder.
    pub fn build(self) -> Result<ConfigFinder> {
        let mut templates = self.convention.templates.clone();
        for template in self.extra_templates {
            match templates.iter_mut().find(|t| t.name() == template.name()) {
                Some(existing) => *existing = template,
                None => templates.push(template),
            }
        }
        for template in &templates {
            template.validate()?;
        }

        if let Some(names) = &self.search_names {
            for name in names {
                discovery::validate_config_name(name)?;
            }
        }
        if let Some(locations) = &self.search_locations {
            for location in locations {
                discovery::validate_wildcard_location(location)?;
            }
        }

        let mut formatters = self.formatters.unwrap_or_else(registry::collect_formatters);
        formatters.extend(self.extra_formatters);

        let resource_loader = match self.resource_loader {
            Some(loader) => loader,
            None => {
                let mut loader = FileResourceLoader::new();
                if let Some(base_dir) = self.base_dir {
                    loader = loader.with_base_dir(base_dir);
                }
                if let Some(roots) = self.classpath_roots {
                    loader = loader.with_classpath_roots(roots);
                }
                Box::new(loader) as Box<dyn ResourceLoader>
            }
        };

        Ok(ConfigFinder {
            convention: self.convention,
            search_names: self.search_names,
            search_locations: self.search_locations,
            formatters,
            resource_loader,
            templates,
            connectors: self.connectors,
        })
    }
}

impl Default for ConfigFinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
