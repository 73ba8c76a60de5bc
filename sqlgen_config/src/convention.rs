//! Naming conventions: where to look, what to look for, which keys to honour.

use crate::candidate::ConnectorTemplate;

/// One configuration convention.
///
/// Search locations are listed from least to most specific; later entries
/// win on conflicting keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    pub search_names: Vec<String>,
    pub search_locations: Vec<String>,
    /// Key listing profiles to activate.
    pub active_profiles_key: String,
    /// Key listing profiles to include.
    pub include_profiles_key: String,
    /// Key a document uses to restrict itself to profiles.
    pub document_profiles_key: String,
    pub config_name_key: String,
    pub config_location_key: String,
    pub additional_location_key: String,
    pub templates: Vec<ConnectorTemplate>,
}

impl Convention {
    /// `db.*` files with plain `url`/`driverClassName`/`username`/`password` keys.
    pub fn db() -> Self {
        Self {
            search_names: vec!["db".to_string()],
            search_locations: split_locations("classpath:/,classpath:/config/,file:./,file:./config/"),
            active_profiles_key: "profiles.active".to_string(),
            include_profiles_key: "profiles.include".to_string(),
            document_profiles_key: "profiles".to_string(),
            config_name_key: "config.name".to_string(),
            config_location_key: "config.location".to_string(),
            additional_location_key: "config.additional-location".to_string(),
            templates: vec![ConnectorTemplate::new(
                "default",
                "url",
                "driverClassName",
                "username",
                "password",
            )],
        }
    }

    /// `application.*` files laid out the Spring Boot way, including the
    /// `spring.datasource.*` keys of common connection pools.
    pub fn spring_boot() -> Self {
        Self {
            search_names: vec!["application".to_string()],
            search_locations: split_locations(
                "classpath:/,classpath:/config/,file:./,file:./config/*/,file:./config/",
            ),
            active_profiles_key: "spring.profiles.active".to_string(),
            include_profiles_key: "spring.profiles.include".to_string(),
            document_profiles_key: "spring.profiles".to_string(),
            config_name_key: "spring.config.name".to_string(),
            config_location_key: "spring.config.location".to_string(),
            additional_location_key: "spring.config.additional-location".to_string(),
            templates: spring_boot_templates(),
        }
    }
}

impl Default for Convention {
    fn default() -> Self {
        Self::db()
    }
}

fn split_locations(list: &str) -> Vec<String> {
    list.split(',').map(str::to_string).collect()
}

fn pool_template(pool: &str, url_key: &str) -> ConnectorTemplate {
    let prefix = format!("spring.datasource.{pool}");
    ConnectorTemplate::new(
        format!("springboot-{pool}"),
        format!("{prefix}.{url_key}"),
        format!("{prefix}.driver-class-name"),
        format!("{prefix}.username"),
        format!("{prefix}.password"),
    )
    .requires(pool)
}

fn spring_boot_templates() -> Vec<ConnectorTemplate> {
    vec![
        ConnectorTemplate::new(
            "springboot-default",
            "spring.datasource.url",
            "spring.datasource.driver-class-name",
            "spring.datasource.username",
            "spring.datasource.password",
        ),
        pool_template("hikari", "jdbc-url"),
        pool_template("tomcat", "url"),
        pool_template("dbcp2", "url"),
        ConnectorTemplate::new(
            "springboot-druid",
            "spring.datasource.druid.url",
            "spring.datasource.druid.driverClassName",
            "spring.datasource.druid.username",
            "spring.datasource.druid.password",
        )
        .requires("druid"),
        ConnectorTemplate::new(
            "springboot-c3p0",
            "c3p0.url",
            "c3p0.driverClass",
            "c3p0.user",
            "c3p0.password",
        )
        .requires("c3p0"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Applicability;

    #[test]
    fn test_db_convention() {
        let convention = Convention::db();
        assert_eq!(convention.search_names, vec!["db"]);
        assert_eq!(convention.search_locations.len(), 4);
        assert_eq!(convention.search_locations[0], "classpath:/");
        assert_eq!(convention.templates.len(), 1);
        assert_eq!(
            convention.templates[0].keys(),
            ["url", "driverClassName", "username", "password"]
        );
    }

    #[test]
    fn test_spring_boot_templates_order() {
        let convention = Convention::spring_boot();
        let names: Vec<&str> = convention.templates.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "springboot-default",
                "springboot-hikari",
                "springboot-tomcat",
                "springboot-dbcp2",
                "springboot-druid",
                "springboot-c3p0",
            ]
        );
        assert_eq!(convention.templates[0].applicability(), &Applicability::Always);
        assert_eq!(
            convention.templates[1].applicability(),
            &Applicability::Requires("hikari".to_string())
        );
        assert_eq!(convention.templates[1].keys()[0], "spring.datasource.hikari.jdbc-url");
    }

    #[test]
    fn test_spring_boot_locations_include_wildcard() {
        let convention = Convention::spring_boot();
        assert!(convention
            .search_locations
            .contains(&"file:./config/*/".to_string()));
        assert_eq!(convention.search_locations.last().map(String::as_str), Some("file:./config/"));
    }
}
