//! # sqlgen_config
//!
//! Locates database connection settings in layered, profile-aware
//! configuration files.
//!
//! A [`ConfigFinder`] walks a list of search locations for files named after
//! the convention's search names (`db.properties`, `application-dev.yml`, ...),
//! merges what it finds so that more specific files and profiles win, and
//! resolves the merged view against a set of connector templates to produce a
//! [`DbConfig`].
//!
//! ## Features
//!
//! - **Profiles**: `dev`, `prod` and friends, activated from the environment
//!   or from the files themselves, with profile expressions like `prod & !eu`
//! - **Formats**: `.properties`, XML properties and multi-document YAML
//! - **Conventions**: plain `db.*` files or Spring Boot `application.*` layouts
//! - **Placeholders**: `${key:default}` references across all loaded files
//!
//! ## Examples
//!
//! ```no_run
//! use sqlgen_config::StandardEnvironment;
//!
//! fn main() -> sqlgen_config::Result<()> {
//!     let env = StandardEnvironment::new().with_active_profiles(["dev"]);
//!
//!     if let Some(config) = sqlgen_config::find(&env)? {
//!         println!("url: {}", config.url());
//!         println!("driver: {}", config.driver_class_name());
//!     }
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod cache;
pub mod candidate;
pub mod convention;
pub mod discovery;
pub mod document;
pub mod environment;
pub mod error;
pub mod finder;
pub mod formatter;
pub mod loader;
pub mod merge;
pub mod placeholder;
pub mod profiles;
pub mod registry;
pub mod source;

pub use builder::ConfigFinderBuilder;
pub use candidate::{Applicability, ConnectorTemplate, DbConfig};
pub use convention::Convention;
pub use document::{Document, DocumentFilter};
pub use environment::{Environment, StandardEnvironment};
pub use error::{Error, Result};
pub use finder::{ConfigFinder, Resolution};
pub use formatter::Formatter;
pub use loader::file::FileResourceLoader;
pub use loader::{Resource, ResourceLoader};
pub use merge::MergedProperties;
pub use profiles::{ProfileTracker, Profiles};
pub use source::{EnvSource, PropertySource};

/// Resolve connection settings with the default `db` convention, searching
/// relative to the working directory.
pub fn find(env: &dyn Environment) -> Result<Option<DbConfig>> {
    ConfigFinder::new(Convention::db())?.find(env)
}
