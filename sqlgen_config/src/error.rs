//! Error types for the sqlgen_config library.

use thiserror::Error;

/// Result type alias for configuration resolution.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving configuration.
///
/// A resolution that simply finds no usable connection settings is not an
/// error; it is reported as `Ok(None)` by the finder.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read a configuration resource.
    #[error("Failed to read configuration resource: {0}")]
    IoError(#[from] std::io::Error),

    /// A format loader rejected the contents of a resource.
    #[error("Failed to parse {format} resource '{resource}': {source}")]
    ParseError {
        format: String,
        resource: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Loading a resource failed; the whole resolution is aborted.
    #[error("{description}")]
    LoadError {
        description: String,
        source: Box<Error>,
    },

    /// A search location is not usable.
    #[error("Search location '{location}' {reason}")]
    InvalidLocation { location: String, reason: String },

    /// A config name override contains a reserved character.
    #[error("Config name '{0}' cannot contain wildcards")]
    InvalidConfigName(String),

    /// A placeholder refers back to itself, directly or indirectly.
    #[error("Circular placeholder reference '{0}' in property definitions")]
    CircularPlaceholder(String),

    /// A declared profile expression could not be parsed.
    #[error("Malformed profile expression '{expression}': {reason}")]
    InvalidProfileExpression { expression: String, reason: String },

    /// A connector template was rejected at registration.
    #[error("Invalid connector template: {0}")]
    InvalidTemplate(String),
}

impl Error {
    /// Wrap this error with resource/location/profile context.
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Error::LoadError {
            description: description.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a parse failure of the given format.
    pub(crate) fn parse(
        format: &str,
        resource: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::ParseError {
            format: format.to_string(),
            resource: resource.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn invalid_location(location: &str, reason: impl Into<String>) -> Self {
        Error::InvalidLocation {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_description_wraps_source() {
        let err = Error::parse("YAML", "file:/tmp/a.yml", "bad indent");
        let wrapped = err.with_description("Failed to load property source from 'file:/tmp/a.yml'");
        match &wrapped {
            Error::LoadError { description, source } => {
                assert!(description.contains("a.yml"));
                assert!(matches!(**source, Error::ParseError { .. }));
            }
            _ => panic!("expected LoadError"),
        }
        assert_eq!(
            wrapped.to_string(),
            "Failed to load property source from 'file:/tmp/a.yml'"
        );
    }

    #[test]
    fn test_invalid_location_message() {
        let err = Error::invalid_location("file:./a/*/b/*/", "cannot contain multiple wildcards");
        assert_eq!(
            err.to_string(),
            "Search location 'file:./a/*/b/*/' cannot contain multiple wildcards"
        );
    }
}
