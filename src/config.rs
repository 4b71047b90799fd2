//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::sync::LazyLock;

use crate::constants::{
    storage_backends, DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS, DEFAULT_DATABASE_MAX_CONNECTIONS,
    DEFAULT_JWT_EXPIRY_HOURS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, MIN_PASSWORD_LENGTH,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub portal: PortalConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Emit JSON log lines instead of the human readable format
    pub log_json: bool,
    pub request_timeout_secs: u64,
}

/// Where documents are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Required for the Postgres backend
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Redis configuration (rate limiting is disabled without a URL)
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
}

/// JWT authentication configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

/// Portal specific settings
#[derive(Debug, Clone, Default)]
pub struct PortalConfig {
    /// Admin identity created at startup when missing
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials of the first administrator
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            portal: PortalConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".to_string()))?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string()))?,
        })
    }
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value {
            storage_backends::POSTGRES => Some(Self::Postgres),
            storage_backends::MEMORY => Some(Self::Memory),
            _ => None,
        }
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| storage_backends::POSTGRES.to_string());
        let backend = StorageBackend::parse(&backend)
            .ok_or_else(|| ConfigError::InvalidValue("STORAGE_BACKEND".to_string()))?;

        let url = env::var("DATABASE_URL").ok();
        if backend == StorageBackend::Postgres && url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL".to_string()));
        }

        Ok(Self {
            backend,
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_DATABASE_MAX_CONNECTIONS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string()))?,
            acquire_timeout_secs: env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("DATABASE_ACQUIRE_TIMEOUT_SECS".to_string())
                })?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET".to_string()))?,
            expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| DEFAULT_JWT_EXPIRY_HOURS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_EXPIRY_HOURS".to_string()))?,
        })
    }
}

impl PortalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok();
        let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok();

        let bootstrap_admin = match (email, password) {
            (Some(email), Some(password)) => {
                if (password.len() as u64) < MIN_PASSWORD_LENGTH {
                    return Err(ConfigError::InvalidValue(
                        "BOOTSTRAP_ADMIN_PASSWORD".to_string(),
                    ));
                }
                Some(BootstrapAdmin { email, password })
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD".to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_EMAIL".to_string()));
            }
        };

        Ok(Self { bootstrap_admin })
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(StorageBackend::parse("postgres"), Some(StorageBackend::Postgres));
        assert_eq!(StorageBackend::parse("memory"), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::parse("firestore"), None);
    }

    #[test]
    fn test_bootstrap_admin_debug_hides_password() {
        let admin = BootstrapAdmin {
            email: "admin@skola.hr".to_string(),
            password: "tajna123".to_string(),
        };
        let printed = format!("{:?}", admin);
        assert!(printed.contains("admin@skola.hr"));
        assert!(!printed.contains("tajna123"));
    }
}
