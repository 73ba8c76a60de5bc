//! Search location and search name discovery.
//!
//! Works out which directories and file stems a resolution visits: the
//! convention's defaults, programmatic overrides, and the config-name and
//! config-location keys of the ambient environment. Also expands wildcard
//! locations into concrete resources.

use crate::convention::Convention;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::loader::{Resource, ResourceLoader};
use url::Url;

const WILDCARD: char = '*';
const CLASSPATH_PREFIX: &str = "classpath:";
const CLASSPATH_ALL_PREFIX: &str = "classpath*:";
const FILE_PREFIX: &str = "file:";

/// Split a comma-separated list, trimming entries and dropping empty and
/// repeated ones.
pub fn comma_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

/// Normalize a location: backslashes become `/`, `.` segments are dropped
/// and `..` segments collapse onto their parent.
pub fn clean_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let (prefix, rest) = match normalized.find(':') {
        Some(i) if !normalized[..i].contains('/') => normalized.split_at(i + 1),
        _ => ("", normalized.as_str()),
    };
    let (root, body) = match rest.strip_prefix('/') {
        Some(body) => ("/", body),
        None => ("", rest),
    };

    let mut segments: Vec<&str> = Vec::new();
    let mut pending_parents = 0usize;
    for segment in body.split('/').rev() {
        match segment {
            "." => {}
            ".." => pending_parents += 1,
            _ if pending_parents > 0 && !segment.is_empty() => pending_parents -= 1,
            _ => segments.push(segment),
        }
    }
    if root.is_empty() {
        segments.extend(std::iter::repeat("..").take(pending_parents));
    }
    segments.reverse();
    format!("{prefix}{root}{}", segments.join("/"))
}

/// Whether `location` already names a scheme (`classpath:`, `file:`, ...).
fn is_url(location: &str) -> bool {
    location.starts_with(CLASSPATH_PREFIX)
        || Url::parse(location).is_ok_and(|url| url.scheme().len() > 1)
}

/// A wildcard must be a single whole directory segment directly followed by
/// the file name (or the trailing `/` of a directory location).
pub fn validate_wildcard_location(location: &str) -> Result<()> {
    if !location.contains(WILDCARD) {
        return Ok(());
    }
    if location.matches(WILDCARD).count() != 1 {
        return Err(Error::invalid_location(
            location,
            "cannot contain multiple wildcards",
        ));
    }
    let directory = match location.rfind('/') {
        Some(i) => &location[..=i],
        None => "",
    };
    if !directory.ends_with("*/") {
        return Err(Error::invalid_location(location, "must end with '*/'"));
    }
    if !directory.ends_with("/*/") {
        return Err(Error::invalid_location(
            location,
            "must use the wildcard as a whole directory segment",
        ));
    }
    Ok(())
}

pub fn validate_config_name(name: &str) -> Result<()> {
    if name.contains(WILDCARD) {
        return Err(Error::InvalidConfigName(name.to_string()));
    }
    Ok(())
}

/// Locations listed under `key`, normalized, or empty when the key is unset.
fn property_locations(env: &dyn Environment, key: &str) -> Result<Vec<String>> {
    let Some(raw) = env.get_property(key) else {
        return Ok(Vec::new());
    };
    let resolved = env.resolve_placeholders(&raw)?;
    let mut locations = Vec::new();
    for entry in comma_list(&resolved) {
        if entry.contains('$') {
            locations.push(entry);
            continue;
        }
        let path = clean_path(&entry);
        if path.starts_with(CLASSPATH_ALL_PREFIX) {
            return Err(Error::invalid_location(
                &path,
                "cannot use a classpath wildcard pattern",
            ));
        }
        validate_wildcard_location(&path)?;
        if is_url(&path) {
            locations.push(path);
        } else {
            locations.push(format!("{FILE_PREFIX}{path}"));
        }
    }
    Ok(locations)
}

/// Search locations for one resolution, least specific first.
///
/// The config-location key replaces the defaults (or the configured
/// locations); the additional-location key appends to them.
pub fn search_locations(
    env: &dyn Environment,
    convention: &Convention,
    configured: Option<&[String]>,
) -> Result<Vec<String>> {
    let mut locations = if env.contains_property(&convention.config_location_key) {
        property_locations(env, &convention.config_location_key)?
    } else {
        let defaults = configured.unwrap_or(&convention.search_locations);
        for location in defaults {
            validate_wildcard_location(location)?;
        }
        defaults.to_vec()
    };
    for location in property_locations(env, &convention.additional_location_key)? {
        if !locations.contains(&location) {
            locations.push(location);
        }
    }
    Ok(locations)
}

/// Search names for one resolution.
pub fn search_names(
    env: &dyn Environment,
    convention: &Convention,
    configured: Option<&[String]>,
) -> Result<Vec<String>> {
    let names = match env.get_property(&convention.config_name_key) {
        Some(raw) => comma_list(&env.resolve_placeholders(&raw)?),
        None => configured.unwrap_or(&convention.search_names).to_vec(),
    };
    for name in &names {
        validate_config_name(name)?;
    }
    Ok(names)
}

/// Resolve a location to resources, expanding a wildcard directory segment
/// into every matching subdirectory in ascending path order.
pub fn resolve_resources(loader: &dyn ResourceLoader, location: &str) -> Vec<Resource> {
    let Some(star) = location.find("*/") else {
        return vec![loader.get_resource(location)];
    };
    let directory = &location[..star];
    let file_name = location.rfind('/').map_or(location, |i| &location[i + 1..]);

    match loader.list_subdirectories(directory) {
        Ok(subdirectories) => subdirectories
            .iter()
            .map(|dir| loader.get_resource(&format!("{dir}{file_name}")))
            .filter(Resource::exists)
            .collect(),
        Err(e) => {
            tracing::trace!(location, error = %e, "Unable to list wildcard directory");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::StandardEnvironment;
    use crate::loader::file::FileResourceLoader;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_comma_list() {
        assert_eq!(comma_list(" a, b ,,c,a "), vec!["a", "b", "c"]);
        assert!(comma_list("").is_empty());
        assert!(comma_list(" , ").is_empty());
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("file:./config/"), "file:config/");
        assert_eq!(clean_path("a/./b/../c"), "a/c");
        assert_eq!(clean_path("config\\db\\"), "config/db/");
        assert_eq!(clean_path("/etc/app/../db/"), "/etc/db/");
        assert_eq!(clean_path("../shared/"), "../shared/");
        assert_eq!(clean_path("classpath:/config/"), "classpath:/config/");
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("classpath:/config/"));
        assert!(is_url("file:./config/"));
        assert!(is_url("file:///etc/app/"));
        assert!(!is_url("./config/"));
        assert!(!is_url("/etc/app/"));
        assert!(!is_url("C:/app/"));
    }

    #[test]
    fn test_validate_wildcard_location() {
        assert!(validate_wildcard_location("file:./config/").is_ok());
        assert!(validate_wildcard_location("file:./config/*/").is_ok());
        assert!(validate_wildcard_location("file:./config/*/db.properties").is_ok());

        let multiple = validate_wildcard_location("file:./a/*/b/*/").unwrap_err();
        assert!(multiple.to_string().contains("multiple wildcards"));

        let trailing = validate_wildcard_location("file:./config/*/sub/").unwrap_err();
        assert!(trailing.to_string().contains("must end with '*/'"));

        assert!(validate_wildcard_location("file:./config/*.properties").is_err());
        assert!(validate_wildcard_location("file:./conf*/").is_err());
    }

    #[test]
    fn test_validate_config_name() {
        assert!(validate_config_name("db").is_ok());
        assert!(matches!(
            validate_config_name("db*"),
            Err(Error::InvalidConfigName(_))
        ));
    }

    #[test]
    fn test_default_locations() {
        let env = StandardEnvironment::new();
        let locations = search_locations(&env, &Convention::db(), None).unwrap();
        assert_eq!(locations, Convention::db().search_locations);
    }

    #[test]
    fn test_config_location_replaces_defaults() {
        let env = StandardEnvironment::new()
            .with_property("config.location", "conf/, classpath:/custom/")
            .with_property("config.additional-location", "${home}/extra/,file:./more/");
        let locations = search_locations(&env, &Convention::db(), None).unwrap();
        assert_eq!(
            locations,
            vec![
                "file:conf/",
                "classpath:/custom/",
                "${home}/extra/",
                "file:more/",
            ]
        );
    }

    #[test]
    fn test_configured_locations_keep_additional() {
        let env = StandardEnvironment::new().with_property("config.additional-location", "/opt/db/");
        let configured = vec!["file:./only/".to_string()];
        let locations = search_locations(&env, &Convention::db(), Some(&configured)).unwrap();
        assert_eq!(locations, vec!["file:./only/", "file:/opt/db/"]);
    }

    #[test]
    fn test_classpath_all_rejected() {
        let env = StandardEnvironment::new().with_property("config.location", "classpath*:/config/");
        let err = search_locations(&env, &Convention::db(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidLocation { .. }));
    }

    #[test]
    fn test_search_names_override() {
        let env = StandardEnvironment::new()
            .with_property("app", "orders")
            .with_property("config.name", "jdbc, ${app}");
        let names = search_names(&env, &Convention::db(), None).unwrap();
        assert_eq!(names, vec!["jdbc", "orders"]);
    }

    #[test]
    fn test_search_names_rejects_wildcard() {
        let env = StandardEnvironment::new().with_property("config.name", "db*");
        assert!(matches!(
            search_names(&env, &Convention::db(), None),
            Err(Error::InvalidConfigName(_))
        ));
    }

    #[test]
    fn test_resolve_resources_wildcard() {
        let dir = TempDir::new().unwrap();
        for sub in ["b", "a", "c"] {
            fs::create_dir_all(dir.path().join("config").join(sub)).unwrap();
        }
        fs::write(dir.path().join("config/a/db.properties"), "url=a").unwrap();
        fs::write(dir.path().join("config/b/db.properties"), "url=b").unwrap();

        let loader = FileResourceLoader::new().with_base_dir(dir.path());
        let resources = resolve_resources(&loader, "file:./config/*/db.properties");
        let locations: Vec<&str> = resources.iter().map(|r| r.location()).collect();
        assert_eq!(
            locations,
            vec!["file:./config/a/db.properties", "file:./config/b/db.properties"]
        );
    }

    #[test]
    fn test_resolve_resources_unlistable_wildcard() {
        let dir = TempDir::new().unwrap();
        let loader = FileResourceLoader::new().with_base_dir(dir.path());
        assert!(resolve_resources(&loader, "file:./missing/*/db.properties").is_empty());
    }

    #[test]
    fn test_resolve_resources_plain() {
        let loader = FileResourceLoader::new();
        let resources = resolve_resources(&loader, "file:./db.properties");
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].location(), "file:./db.properties");
    }
}
