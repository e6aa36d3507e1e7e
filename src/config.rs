//! Startup configuration read from the environment
//!
//! Both binaries call `dotenvy::dotenv()` first, so a local `.env` file can
//! supply any of these variables.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::llm::OpenRouterConfig;
use crate::store::{PgStoreConfig, StoreBackend};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Configuration of the `burrow` server
#[derive(Debug, Clone)]
pub struct Config {
    /// Scopes every stored row
    pub app_id: String,
    pub backend: StoreBackend,
    pub bind: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let app_id = required(&lookup, "STORE_APP_ID")?;

        let backend = match lookup("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "memory" => StoreBackend::Memory,
            "postgres" => {
                let url = required(&lookup, "STORE_URL")?;
                let mut store = PgStoreConfig::from_connection_string(&url).map_err(|e| {
                    ConfigError::Invalid {
                        var: "STORE_URL",
                        reason: e.to_string(),
                    }
                })?;
                if let Some(schema) = lookup("STORE_SCHEMA") {
                    store = store.with_schema(schema);
                }
                if let Some(size) = parsed::<usize>(&lookup, "STORE_POOL_SIZE")? {
                    store = store.with_max_pool_size(size);
                }
                StoreBackend::Postgres(store)
            }
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    reason: format!("expected `postgres` or `memory`, got `{}`", other),
                })
            }
        };

        Ok(Self {
            app_id,
            backend,
            bind: bind_address(&lookup, 3000)?,
        })
    }
}

/// Configuration of the `burrow-legacy` server
#[derive(Debug, Clone)]
pub struct LegacyConfig {
    pub openrouter: OpenRouterConfig,
    pub bind: SocketAddr,
}

impl LegacyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut openrouter = OpenRouterConfig::new(required(&lookup, "OPENROUTER_API_KEY")?);
        if let Some(base_url) = lookup("OPENROUTER_BASE_URL") {
            openrouter.base_url = base_url;
        }
        if let Some(site_url) = lookup("SITE_URL") {
            openrouter.site_url = site_url;
        }
        if let Some(site_name) = lookup("SITE_NAME") {
            openrouter.site_name = site_name;
        }

        Ok(Self {
            openrouter,
            bind: bind_address(&lookup, 8000)?,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    lookup(var)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn bind_address(
    lookup: &impl Fn(&str) -> Option<String>,
    default_port: u16,
) -> Result<SocketAddr, ConfigError> {
    let host = parsed::<IpAddr>(lookup, "HOST")?.unwrap_or(IpAddr::from([127, 0, 0, 1]));
    let port = parsed::<u16>(lookup, "PORT")?.unwrap_or(default_port);
    Ok(SocketAddr::new(host, port))
}
