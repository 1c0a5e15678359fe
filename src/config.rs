//! Service configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! `PR_REVIEW_*` environment variables. Every field has a default, so an
//! empty file (or no file at all) yields a runnable configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: '{value}'")]
    InvalidOverride { var: &'static str, value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

/// Upper bound for `server.request_timeout_secs`.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 3_600;

/// Upper bound for `database.max_connections`.
pub const MAX_DB_CONNECTIONS: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployment environment label, only used in logs.
    pub env: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    /// Deadline applied to every request.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: "local".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pr-review.db"),
            max_connections: crate::db::pool::DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Config {
    /// Load configuration from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_overrides_from(|var| std::env::var(var).ok())?;

        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.display().to_string(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `PR_REVIEW_*` overrides resolved through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("PR_REVIEW_ENV") {
            self.env = env;
        }
        if let Some(addr) = lookup("PR_REVIEW_LISTEN_ADDRESS") {
            self.server.listen_address = addr;
        }
        if let Some(value) = lookup("PR_REVIEW_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs =
                parse_override("PR_REVIEW_REQUEST_TIMEOUT_SECS", value)?;
        }
        if let Some(path) = lookup("PR_REVIEW_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(value) = lookup("PR_REVIEW_DB_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_override("PR_REVIEW_DB_MAX_CONNECTIONS", value)?;
        }

        self.validate()
    }

    /// Check numeric settings against their allowed ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "server.request_timeout_secs",
            self.server.request_timeout_secs,
            1,
            MAX_REQUEST_TIMEOUT_SECS,
        )?;
        check_range(
            "database.max_connections",
            u64::from(self.database.max_connections),
            1,
            u64::from(MAX_DB_CONNECTIONS),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

fn parse_override<T: std::str::FromStr>(
    var: &'static str,
    value: String,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { var, value })
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
