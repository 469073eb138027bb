use std::env;

use log::info;
use thiserror::Error;

use crate::db::sql::DEFAULT_MAX_CONNECTIONS;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub seed_demo_poll: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = required(&lookup, "PORT")?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => parse("DB_MAX_CONNECTIONS", raw)?,
            None => {
                info!("DB_MAX_CONNECTIONS not set, using default: {}", DEFAULT_MAX_CONNECTIONS);
                DEFAULT_MAX_CONNECTIONS
            }
        };

        let seed_demo_poll = lookup("SEED_DEMO_POLL")
            .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            port,
            max_connections,
            seed_demo_poll,
        })
    }
}

fn required<F, T>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key).ok_or(ConfigError::Missing(key))?;
    parse(key, raw)
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}
