//! Application configuration loaded from environment variables.

use common::OrganizationId;
use thiserror::Error;

/// A variable was set to something unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid UUID: {value}")]
    InvalidUuid { name: &'static str, value: String },

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("ORGANIZATION_ID is required when DATABASE_URL is set")]
    MissingOrganization,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset runs on the
///   in-memory demo menu
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `ORGANIZATION_ID`: restaurant whose menu and orders are served
/// - `RESTAURANT_NAME`: shown in the handoff response
/// - `RESTAURANT_WHATSAPP`: number the handoff message goes to
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub organization_id: Option<OrganizationId>,
    pub restaurant_name: String,
    pub restaurant_whatsapp: Option<String>,
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match non_empty("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
                name: "PORT",
                value,
            })?,
            None => defaults.port,
        };
        let database_max_connections = match non_empty("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
                name: "DATABASE_MAX_CONNECTIONS",
                value,
            })?,
            None => defaults.database_max_connections,
        };
        let organization_id = non_empty("ORGANIZATION_ID")
            .map(|value| {
                uuid::Uuid::parse_str(&value)
                    .map(OrganizationId::from_uuid)
                    .map_err(|_| ConfigError::InvalidUuid {
                        name: "ORGANIZATION_ID",
                        value,
                    })
            })
            .transpose()?;

        let config = Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections,
            organization_id,
            restaurant_name: non_empty("RESTAURANT_NAME").unwrap_or(defaults.restaurant_name),
            restaurant_whatsapp: non_empty("RESTAURANT_WHATSAPP"),
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.database_url.is_some() && self.organization_id.is_none() {
            return Err(ConfigError::MissingOrganization);
        }
        Ok(())
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 5,
            organization_id: None,
            restaurant_name: "Restaurante".to_string(),
            restaurant_whatsapp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database_max_connections, 5);
        assert!(config.database_url.is_none());
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_database_requires_organization() {
        let config = Config {
            database_url: Some("postgres://localhost/storefront".to_string()),
            ..Config::default()
        };
        assert!(matches!(config.check(), Err(ConfigError::MissingOrganization)));

        let config = Config {
            organization_id: Some(OrganizationId::new()),
            ..config
        };
        assert!(config.check().is_ok());
    }
}
