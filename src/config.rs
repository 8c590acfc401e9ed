//! Service configuration, loaded from the environment (and `.env` via dotenv).

use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_BOOKING_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    /// How long SQLite waits on its write lock before giving up.
    pub busy_timeout: Duration,
    /// Deadline for a single booking, lock wait included.
    pub booking_timeout: Duration,
}

impl Config {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            booking_timeout: Duration::from_millis(DEFAULT_BOOKING_TIMEOUT_MS),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let mut config = Self::new(database_url);

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        config.port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        config.max_connections =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        config.busy_timeout = Duration::from_millis(parse_or(
            &lookup,
            "DATABASE_BUSY_TIMEOUT_MS",
            DEFAULT_BUSY_TIMEOUT_MS,
        )?);
        config.booking_timeout = Duration::from_millis(parse_or(
            &lookup,
            "BOOKING_TIMEOUT_MS",
            DEFAULT_BOOKING_TIMEOUT_MS,
        )?);

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
