//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Headroom between the ledger deadline and the HTTP request timeout
const LEDGER_DEADLINE_MARGIN: Duration = Duration::from_millis(500);

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HS256 secret for bearer tokens
    pub token_secret: String,

    /// Bearer token lifetime in hours
    pub token_ttl_hours: i64,

    /// Per-request deadline in seconds
    pub request_timeout_secs: u64,

    /// Sustained requests per second across the whole server
    pub rate_limit_per_second: u32,

    /// Requests allowed in a single burst
    pub rate_limit_burst: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;
        let token_secret = lookup("TOKEN_SECRET").ok_or(ConfigError::MissingEnv("TOKEN_SECRET"))?;

        if token_secret.is_empty() {
            return Err(ConfigError::InvalidValue("TOKEN_SECRET"));
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            token_secret,
            token_ttl_hours: parse_or(&lookup, "TOKEN_TTL_HOURS", 72)?,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10)?,
            rate_limit_per_second: parse_or(&lookup, "RATE_LIMIT_PER_SECOND", 1100)?,
            rate_limit_burst: parse_or(&lookup, "RATE_LIMIT_BURST", 200)?,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Deadline for a single ledger operation. Kept under the HTTP request
    /// timeout so an expired transaction answers with `DeadlineExceeded`
    /// before the timeout layer cuts the request off.
    pub fn ledger_deadline(&self) -> Duration {
        let timeout = self.request_timeout();
        timeout.saturating_sub(LEDGER_DEADLINE_MARGIN).max(timeout / 2)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/merch"),
            ("TOKEN_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.token_ttl_hours, 72);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.rate_limit_per_second, 1100);
        assert_eq!(config.rate_limit_burst, 200);
        assert!(!config.is_production());
    }

    #[test]
    fn test_ledger_deadline_fires_before_request_timeout() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("TOKEN_SECRET", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.ledger_deadline(), Duration::from_millis(9_500));
        assert!(config.ledger_deadline() < config.request_timeout());

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("TOKEN_SECRET", "secret"),
            ("REQUEST_TIMEOUT_SECS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.ledger_deadline(), Duration::from_millis(500));
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(lookup(&[("TOKEN_SECRET", "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("DATABASE_URL")));

        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("TOKEN_SECRET")));
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("TOKEN_SECRET", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue("PORT")));
    }
}
