//! Resource access abstraction.
//!
//! The `ResourceLoader` trait maps location strings (`classpath:/db.yml`,
//! `file:./config/`, plain paths) to [`Resource`] handles and enumerates
//! subdirectories for wildcard locations. Loaders are read-only and may be
//! shared between finders.
//!
//! Built-in loaders:
//! - `FileResourceLoader`: local file system with `classpath:` roots

pub mod file;

use crate::error::Result;
use std::path::{Path, PathBuf};
use url::Url;

/// A handle to one candidate location.
///
/// Creating a resource does not touch the file system; `exists()` and
/// `read()` do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    location: String,
    path: PathBuf,
}

impl Resource {
    pub fn new(location: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            path: path.into(),
        }
    }

    /// The location string this resource was resolved from.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn filename(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// File extension without the dot; `None` when missing or empty.
    pub fn extension(&self) -> Option<&str> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
    }

    /// A `file://` URI for the resource, or its location if none can be built.
    pub fn uri(&self) -> String {
        let absolute = if self.path.is_absolute() {
            Some(self.path.clone())
        } else {
            std::env::current_dir().ok().map(|cwd| cwd.join(&self.path))
        };
        absolute
            .and_then(|p| Url::from_file_path(p).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| self.location.clone())
    }

    /// Identity used to memoize parses of the same physical resource.
    pub fn identity(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Raw bytes of the resource; decoding is left to the formatter.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

/// Maps locations to resources.
pub trait ResourceLoader: Send + Sync {
    /// Resolve a location string. Never fails; missing resources report
    /// `exists() == false`.
    fn get_resource(&self, location: &str) -> Resource;

    /// Immediate subdirectories of the directory at `location`, as location
    /// strings ending in `/`, sorted by absolute path.
    fn list_subdirectories(&self, location: &str) -> Result<Vec<String>>;

    /// Human-readable name for log messages.
    fn name(&self) -> &str;
}
