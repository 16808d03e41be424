//! Configuration loading and representation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the SQLite connection URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Environment variable holding the pool size.
pub const DATABASE_MAX_CONNECTIONS_VAR: &str = "DATABASE_MAX_CONNECTIONS";

const DEFAULT_URL: &str = "sqlite::memory:";
const DEFAULT_MAX_CONNECTIONS: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLx SQLite URL, e.g. `sqlite::memory:` or `sqlite://checkout.db`.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseConfig {
    /// Private in-memory store; its data is gone once the pool closes.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `DATABASE_URL` / `DATABASE_MAX_CONNECTIONS`, falling back to
    /// an in-memory store with a single connection.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test fixtures, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(DATABASE_URL_VAR) {
            if url.trim().is_empty() {
                return Err(ConfigError::Empty {
                    key: DATABASE_URL_VAR,
                });
            }
            config.url = url;
        }

        if let Some(raw) = lookup(DATABASE_MAX_CONNECTIONS_VAR) {
            config.max_connections = match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: DATABASE_MAX_CONNECTIONS_VAR,
                        value: raw,
                    });
                }
            };
        }

        Ok(config)
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_single_connection_in_memory_store() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, DatabaseConfig::in_memory());
        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn reads_url_and_pool_size() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_VAR, "sqlite://checkout.db"),
            (DATABASE_MAX_CONNECTIONS_VAR, "4"),
        ]))
        .unwrap();
        assert_eq!(config.url, "sqlite://checkout.db");
        assert_eq!(config.max_connections, 4);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn rejects_empty_url() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[(DATABASE_URL_VAR, " ")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty { key: DATABASE_URL_VAR });
    }

    #[test]
    fn rejects_invalid_pool_size() {
        for raw in ["0", "-1", "many"] {
            let err = DatabaseConfig::from_lookup(lookup_from(&[(DATABASE_MAX_CONNECTIONS_VAR, raw)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{raw}");
        }
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{ "url": "sqlite://orders.db" }"#).unwrap();
        assert_eq!(config.url, "sqlite://orders.db");
        assert_eq!(config.max_connections, 1);
    }
}
