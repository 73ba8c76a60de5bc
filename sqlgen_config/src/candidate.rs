//! Connector property templates and the resolved connection settings.
//!
//! A template names the four keys that together describe one way of
//! spelling a database connection in configuration. The finder evaluates
//! templates in registration order against the merged view and keeps the
//! first one whose values are all present and non-blank.

use crate::error::{Error, Result};
use crate::merge::MergedProperties;
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeSet;
use std::fmt;

/// Whether a template takes part in a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applicability {
    Always,
    Never,
    /// Only when the named connector was declared available.
    Requires(String),
}

impl Applicability {
    pub fn is_applicable(&self, connectors: &BTreeSet<String>) -> bool {
        match self {
            Applicability::Always => true,
            Applicability::Never => false,
            Applicability::Requires(connector) => connectors.contains(connector),
        }
    }
}

/// The four property keys of one connection spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorTemplate {
    name: String,
    url_key: String,
    driver_key: String,
    username_key: String,
    password_key: String,
    applicability: Applicability,
}

impl ConnectorTemplate {
    /// Create an always-applicable template.
    pub fn new(
        name: impl Into<String>,
        url_key: impl Into<String>,
        driver_key: impl Into<String>,
        username_key: impl Into<String>,
        password_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url_key: url_key.into(),
            driver_key: driver_key.into(),
            username_key: username_key.into(),
            password_key: password_key.into(),
            applicability: Applicability::Always,
        }
    }

    /// Restrict the template to resolutions where `connector` is available.
    pub fn requires(mut self, connector: impl Into<String>) -> Self {
        self.applicability = Applicability::Requires(connector.into());
        self
    }

    pub fn with_applicability(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn applicability(&self) -> &Applicability {
        &self.applicability
    }

    /// The url, driver, username and password keys, in that order.
    pub fn keys(&self) -> [&str; 4] {
        [
            &self.url_key,
            &self.driver_key,
            &self.username_key,
            &self.password_key,
        ]
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidTemplate("template name must not be blank".into()));
        }
        if self.keys().iter().any(|k| k.trim().is_empty()) {
            return Err(Error::InvalidTemplate(format!(
                "template '{}' has a blank property key",
                self.name
            )));
        }
        Ok(())
    }

    /// Look up the four keys; `None` unless every value is non-blank.
    pub fn resolve(&self, properties: &MergedProperties) -> Result<Option<DbConfig>> {
        let mut values: [String; 4] = Default::default();
        for (slot, key) in values.iter_mut().zip(self.keys()) {
            match properties.get_property(key)? {
                Some(value) if !value.trim().is_empty() => *slot = value,
                _ => return Ok(None),
            }
        }
        let [url, driver, username, password] = values;
        Ok(Some(DbConfig::new(url, driver, username, password)))
    }
}

/// Pick the first applicable template that resolves completely.
pub fn select(
    templates: &[ConnectorTemplate],
    connectors: &BTreeSet<String>,
    properties: &MergedProperties,
) -> Result<Option<DbConfig>> {
    for template in templates {
        if !template.applicability.is_applicable(connectors) {
            tracing::trace!(template = template.name(), "Skipped inapplicable template");
            continue;
        }
        if let Some(config) = template.resolve(properties)? {
            tracing::debug!(template = template.name(), "Selected connector template");
            return Ok(Some(config));
        }
    }
    Ok(None)
}

/// Resolved database connection settings.
///
/// The password is held as a [`SecretString`]; `Debug` and `Display` redact it.
#[derive(Clone, Debug)]
pub struct DbConfig {
    url: String,
    driver_class_name: String,
    username: String,
    password: SecretString,
}

impl DbConfig {
    pub fn new(
        url: impl Into<String>,
        driver_class_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password: String = password.into();
        Self {
            url: url.into(),
            driver_class_name: driver_class_name.into(),
            username: username.into(),
            password: SecretString::new(password.into_boxed_str()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn driver_class_name(&self) -> &str {
        &self.driver_class_name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// All four values are non-blank.
    pub fn is_valid(&self) -> bool {
        [
            self.url.as_str(),
            self.driver_class_name.as_str(),
            self.username.as_str(),
            self.password(),
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }
}

impl PartialEq for DbConfig {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.driver_class_name == other.driver_class_name
            && self.username == other.username
            && self.password() == other.password()
    }
}

impl Eq for DbConfig {}

impl fmt::Display for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DbConfig{{url='{}', driverClassName='{}', username='{}', password={:?}}}",
            self.url, self.driver_class_name, self.username, self.password
        )
    }
}
