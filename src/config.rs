use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Knobs the order engine needs inside its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quantity at or below which a non-empty product is flagged low on stock.
    pub low_stock_threshold: i32,
    /// Upper bound on waiting for a row lock before the operation fails.
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            lock_timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub run_migrations: bool,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;
        let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;

        let defaults = EngineConfig::default();
        let low_stock_threshold = parse_or(&lookup, "LOW_STOCK_THRESHOLD", defaults.low_stock_threshold)?;
        if low_stock_threshold < 0 {
            return Err(ConfigError::Invalid {
                name: "LOW_STOCK_THRESHOLD",
                value: low_stock_threshold.to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        let lock_timeout_ms = parse_or(&lookup, "LOCK_TIMEOUT_MS", 5000u64)?;
        if lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "LOCK_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be positive (0 disables the timeout in PostgreSQL)".to_string(),
            });
        }

        Ok(Self {
            database_url,
            host,
            port,
            run_migrations,
            engine: EngineConfig {
                low_stock_threshold,
                lock_timeout: Duration::from_millis(lock_timeout_ms),
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
