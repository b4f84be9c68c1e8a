//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole HTTP request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Deadline for a single store call, in seconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_store_timeout() -> u64 {
    3
}

impl DatabaseConfig {
    /// Deadline applied to every repository call.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

/// JWT settings as read from configuration sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    86_400 // 24 hours
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BILLET").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("BILLET__DATABASE__URL", Some("postgres://localhost/billet_test")),
                ("BILLET__JWT__SECRET", Some("test-secret")),
                ("BILLET__SERVER__PORT", None),
                ("BILLET__DATABASE__STORE_TIMEOUT_SECS", None),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "postgres://localhost/billet_test");
                assert_eq!(config.jwt.secret, "test-secret");
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.server.port, 4000);
                assert_eq!(config.database.store_timeout(), Duration::from_secs(3));
                assert_eq!(config.database.max_connections, 10);
            },
        );
    }

    #[test]
    fn test_environment_overrides_defaults() {
        temp_env::with_vars(
            [
                ("BILLET__DATABASE__URL", Some("postgres://db/billet")),
                ("BILLET__DATABASE__STORE_TIMEOUT_SECS", Some("7")),
                ("BILLET__JWT__SECRET", Some("s")),
                ("BILLET__SERVER__PORT", Some("8081")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.port, 8081);
                assert_eq!(config.database.store_timeout(), Duration::from_secs(7));
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("BILLET__DATABASE__URL", None::<&str>),
                ("BILLET__JWT__SECRET", Some("s")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
