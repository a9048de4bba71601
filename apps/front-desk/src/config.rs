//! Front-desk configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Front-desk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontDeskConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Install the default floor plan on an empty database at startup
    pub seed_tables: bool,
}

impl Default for FrontDeskConfig {
    fn default() -> Self {
        FrontDeskConfig {
            db_path: PathBuf::from("./bistro.db"),
            max_connections: 5,
            seed_tables: true,
        }
    }
}

impl FrontDeskConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn load_from(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = FrontDeskConfig::default();

        let db_path = var("BISTRO_DB_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let max_connections = match var("BISTRO_DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("BISTRO_DB_MAX_CONNECTIONS".to_string()))?,
            None => defaults.max_connections,
        };

        let seed_tables = match var("BISTRO_SEED_TABLES") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| ConfigError::InvalidValue("BISTRO_SEED_TABLES".to_string()))?,
            None => defaults.seed_tables,
        };

        Ok(FrontDeskConfig {
            db_path,
            max_connections,
            seed_tables,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
