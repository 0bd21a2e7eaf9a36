//! Environment-driven configuration. `.env` is loaded by the binaries
//! before [`Config::from_env`] runs.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub storage: StorageConfig,
    pub gemini: GeminiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| get(name).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", DEFAULT_PORT)?;

        let database_url = get("DATABASE_URL");
        let default_backend = if database_url.is_some() { "postgres" } else { "memory" };
        let backend = get("STORAGE_BACKEND").unwrap_or_else(|| default_backend.to_string());
        let storage = match backend.as_str() {
            "memory" => StorageConfig::Memory,
            "postgres" => StorageConfig::Postgres {
                url: database_url.ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            },
            _ => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: backend,
                    reason: "expected `memory` or `postgres`",
                })
            }
        };

        let timeout_secs: u64 = parse_or(&get, "GENERATION_TIMEOUT_SECS", 120)?;
        let gemini = GeminiConfig {
            api_key: get("GEMINI_API_KEY"),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            port,
            storage,
            gemini,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            reason: "not a valid number",
        }),
    }
}
