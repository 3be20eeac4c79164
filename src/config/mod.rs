use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/anytime";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 12;

/// `DATABASE_URL` value selecting the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub auth_jwt_secret: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_jwt_secret = env::var("AUTH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("AUTH_JWT_SECRET"))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            host: parse_var("HOST", env::var("HOST").ok(), DEFAULT_HOST.parse().ok())?,
            port: parse_var("PORT", env::var("PORT").ok(), Some(DEFAULT_PORT))?,
            auth_jwt_secret,
            request_timeout: Duration::from_secs(parse_var(
                "REQUEST_TIMEOUT_SECS",
                env::var("REQUEST_TIMEOUT_SECS").ok(),
                Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            )?),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        let port: u16 = parse_var("PORT", None, Some(3001)).unwrap();
        assert_eq!(port, 3001);

        let port: u16 = parse_var("PORT", Some("  ".to_string()), Some(3001)).unwrap();
        assert_eq!(port, 3001);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        let result: Result<u16, _> = parse_var("PORT", Some("eighty".to_string()), Some(3001));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_bind_addr() {
        let config = Config {
            database_url: MEMORY_DATABASE_URL.to_string(),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            auth_jwt_secret: "secret".to_string(),
            request_timeout: Duration::from_secs(12),
        };
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
        assert!(config.uses_memory_store());
    }
}
