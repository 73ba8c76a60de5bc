//! File-system resource loader.
//!
//! Handles `classpath:` locations (resolved against classpath roots),
//! `file:` prefixes, `file://` URLs and plain paths. Relative paths are
//! resolved against an optional base directory, otherwise against the
//! process working directory.

use crate::error::Result;
use crate::loader::{Resource, ResourceLoader};
use std::path::{Path, PathBuf};
use url::Url;

const CLASSPATH_PREFIX: &str = "classpath:";
const FILE_PREFIX: &str = "file:";
const FILE_URL_PREFIX: &str = "file://";

/// Default classpath root, relative to the base directory.
pub const DEFAULT_CLASSPATH_ROOT: &str = "resources";

/// Loader for the local file system.
///
/// A `classpath:` location resolves to the first classpath root that
/// contains it; when none does, it resolves under the first root.
#[derive(Debug, Clone)]
pub struct FileResourceLoader {
    base_dir: Option<PathBuf>,
    classpath_roots: Vec<PathBuf>,
}

impl FileResourceLoader {
    pub fn new() -> Self {
        Self {
            base_dir: None,
            classpath_roots: vec![PathBuf::from(DEFAULT_CLASSPATH_ROOT)],
        }
    }

    /// Resolve relative paths against `base_dir` instead of the working directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Replace the classpath roots, searched in the given order.
    pub fn with_classpath_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.classpath_roots = roots.into_iter().map(Into::into).collect();
        self
    }

    fn absolutize(&self, path: &Path) -> PathBuf {
        let joined = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        // Drops interior `.` segments.
        joined.components().collect()
    }

    fn resolve_path(&self, location: &str) -> PathBuf {
        if let Some(rest) = location.strip_prefix(CLASSPATH_PREFIX) {
            let relative = rest.trim_start_matches('/');
            let candidates: Vec<PathBuf> = self
                .classpath_roots
                .iter()
                .map(|root| self.absolutize(root).join(relative))
                .collect();
            return candidates
                .iter()
                .find(|p| p.exists())
                .or_else(|| candidates.first())
                .cloned()
                .unwrap_or_else(|| self.absolutize(Path::new(relative)));
        }
        if location.starts_with(FILE_URL_PREFIX) {
            if let Some(path) = Url::parse(location)
                .ok()
                .and_then(|url| url.to_file_path().ok())
            {
                return path;
            }
        }
        let plain = location.strip_prefix(FILE_PREFIX).unwrap_or(location);
        self.absolutize(Path::new(plain))
    }
}

impl Default for FileResourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader for FileResourceLoader {
    fn get_resource(&self, location: &str) -> Resource {
        Resource::new(location, self.resolve_path(location))
    }

    fn list_subdirectories(&self, location: &str) -> Result<Vec<String>> {
        let dir = self.resolve_path(location);
        let mut subdirectories: Vec<(PathBuf, String)> = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            subdirectories.push((path, name));
        }
        subdirectories.sort_by(|a, b| a.0.cmp(&b.0));

        let separator = if location.ends_with('/') { "" } else { "/" };
        Ok(subdirectories
            .into_iter()
            .map(|(_, name)| format!("{location}{separator}{name}/"))
            .collect())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_file_prefix_relative_to_base() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("config/db.properties"), "url=x");

        let loader = FileResourceLoader::new().with_base_dir(dir.path());
        let resource = loader.get_resource("file:./config/db.properties");
        assert!(resource.exists());
        assert_eq!(resource.path(), dir.path().join("config/db.properties"));
        assert_eq!(resource.location(), "file:./config/db.properties");
    }

    #[test]
    fn test_plain_and_url_paths() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("db.yml");
        write(&file, "url: x");

        let loader = FileResourceLoader::new();
        assert!(loader.get_resource(file.to_str().unwrap()).exists());

        let url = Url::from_file_path(&file).unwrap().to_string();
        assert!(loader.get_resource(&url).exists());
    }

    #[test]
    fn test_classpath_first_root_wins() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("second/db.properties"), "url=second");
        write(&dir.path().join("third/db.properties"), "url=third");

        let loader = FileResourceLoader::new()
            .with_base_dir(dir.path())
            .with_classpath_roots(["first", "second", "third"]);
        let resource = loader.get_resource("classpath:/db.properties");
        assert!(resource.exists());
        assert_eq!(resource.path(), dir.path().join("second/db.properties"));
    }

    #[test]
    fn test_classpath_missing_uses_first_root() {
        let dir = TempDir::new().unwrap();
        let loader = FileResourceLoader::new().with_base_dir(dir.path());
        let resource = loader.get_resource("classpath:/config/db.properties");
        assert!(!resource.exists());
        assert_eq!(
            resource.path(),
            dir.path().join(DEFAULT_CLASSPATH_ROOT).join("config/db.properties")
        );
    }

    #[test]
    fn test_list_subdirectories_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["b", "a", "c"] {
            fs::create_dir_all(dir.path().join("config").join(name)).unwrap();
        }
        write(&dir.path().join("config/file.txt"), "");

        let loader = FileResourceLoader::new().with_base_dir(dir.path());
        let subdirectories = loader.list_subdirectories("file:./config/").unwrap();
        assert_eq!(
            subdirectories,
            vec!["file:./config/a/", "file:./config/b/", "file:./config/c/"]
        );
    }

    #[test]
    fn test_list_subdirectories_missing_dir() {
        let dir = TempDir::new().unwrap();
        let loader = FileResourceLoader::new().with_base_dir(dir.path());
        assert!(loader.list_subdirectories("file:./nope/").is_err());
    }
}
