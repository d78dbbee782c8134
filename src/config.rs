use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5500;
const DEFAULT_DB_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_CACHE_POOL_MAX_OPEN: u32 = 16;
const DEFAULT_CACHE_POOL_MIN_IDLE: u32 = 8;
const DEFAULT_CACHE_EXPIRE_SECONDS: u64 = 60;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub bind_address: String,
    pub port: u16,
    pub db_pool_max_size: u32,
    pub cache_pool_max_open: u32,
    pub cache_pool_min_idle: u32,
    pub cache_expire_seconds: u64,
}

impl Config {
    /// Reads the configuration from the process environment. Call
    /// `dotenv::dotenv()` first if a `.env` file should be honoured.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Config {
            database_url,
            redis_url: get("REDIS_URL"),
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            db_pool_max_size: parse_or(&get, "DB_POOL_MAX_SIZE", DEFAULT_DB_POOL_MAX_SIZE)?,
            cache_pool_max_open: parse_or(&get, "CACHE_POOL_MAX_OPEN", DEFAULT_CACHE_POOL_MAX_OPEN)?,
            cache_pool_min_idle: parse_or(&get, "CACHE_POOL_MIN_IDLE", DEFAULT_CACHE_POOL_MIN_IDLE)?,
            cache_expire_seconds: parse_or(
                &get,
                "CACHE_EXPIRE_SECONDS",
                DEFAULT_CACHE_EXPIRE_SECONDS,
            )?,
        })
    }
}

fn parse_or<T, F>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "mysql://localhost/menu")]))
            .unwrap();

        assert_eq!(config.database_url, "mysql://localhost/menu");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, 5500);
        assert_eq!(config.db_pool_max_size, 10);
        assert_eq!(config.cache_pool_max_open, 16);
        assert_eq!(config.cache_pool_min_idle, 8);
        assert_eq!(config.cache_expire_seconds, 60);
    }

    #[test]
    fn database_url_is_required() {
        let err = Config::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "mysql://db/menu"),
            ("REDIS_URL", "redis://cache:6379"),
            ("BIND_ADDRESS", "0.0.0.0"),
            ("PORT", " 8080 "),
            ("DB_POOL_MAX_SIZE", "4"),
            ("CACHE_EXPIRE_SECONDS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_pool_max_size, 4);
        assert_eq!(config.cache_expire_seconds, 5);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "mysql://db/menu"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }
}
