//! Configuration module for the tool finder backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to the SQLite database backing the remote store
    pub db_path: PathBuf,
    /// Directory holding the local mirror of saved collections
    pub local_store_path: PathBuf,
    /// Catalog JSON file; the bundled catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Create the user-data tables on startup
    pub provision_tables: bool,
    /// Pause before returning a synthesized answer
    pub typing_delay: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("TOOLFINDER_API_PSK")
            .ok()
            .filter(|psk| !psk.trim().is_empty());

        let db_path = env::var("TOOLFINDER_DB_PATH")
            .unwrap_or_else(|_| "./data/toolfinder.sqlite".to_string())
            .into();

        let local_store_path = env::var("TOOLFINDER_LOCAL_STORE_PATH")
            .unwrap_or_else(|_| "./data/local".to_string())
            .into();

        let catalog_path = env::var("TOOLFINDER_CATALOG_PATH").ok().map(PathBuf::from);

        let bind_addr_raw =
            env::var("TOOLFINDER_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_addr_raw.parse().map_err(|_| {
            AppError::Validation(format!(
                "Invalid TOOLFINDER_BIND_ADDR format: {}",
                bind_addr_raw
            ))
        })?;

        let log_level = env::var("TOOLFINDER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let provision_tables = env_flag("TOOLFINDER_PROVISION_TABLES", true);
        let typing_delay = env_flag("TOOLFINDER_TYPING_DELAY", false);

        Ok(Self {
            api_psk,
            db_path,
            local_store_path,
            catalog_path,
            bind_addr,
            log_level,
            provision_tables,
            typing_delay,
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => parse_flag(&value).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
