//! Authorization service configuration, loaded from environment variables.

use serde::Deserialize;

/// Authorization service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// PostgreSQL connection URL. When absent, assignments are served from
    /// the seeded in-memory repository.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
}

fn default_bind_address() -> String {
    "127.0.0.1:8081".to_string()
}

fn default_database_max_connections() -> u32 {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_url: None,
            database_max_connections: default_database_max_connections(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default().separator("__"))
    }

    fn from_environment(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1:8081");
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 5);
    }

    #[test]
    fn empty_source_uses_defaults() {
        let config: ServiceConfig = config::Config::builder()
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");
        assert_eq!(config.bind_address, "127.0.0.1:8081");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn environment_values_are_read_verbatim() {
        let vars: config::Map<String, String> = [
            ("DATABASE_URL", "postgres://authz:0071@db/authz"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = ServiceConfig::from_environment(
            config::Environment::default()
                .separator("__")
                .source(Some(vars)),
        )
        .expect("config");

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://authz:0071@db/authz")
        );
        assert_eq!(config.database_max_connections, 12);
    }
}
