//! Configuration module for the snippet backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

/// Actor used for favorites until sessions exist.
pub const DEFAULT_ACTOR_ID: &str = "a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Actor id every favorite operation is performed as
    pub actor_id: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("SNIPPETS_DB_PATH")
            .unwrap_or_else(|_| "./data/snippets.sqlite".to_string())
            .into();

        let bind_addr = env::var("SNIPPETS_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
            .parse()?;

        let log_level = env::var("SNIPPETS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let actor_id = env::var("SNIPPETS_ACTOR_ID")
            .ok()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ACTOR_ID.to_string());

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            actor_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases share one test so they never race on the process environment.
    #[test]
    fn test_config_from_env() {
        env::remove_var("SNIPPETS_DB_PATH");
        env::remove_var("SNIPPETS_BIND_ADDR");
        env::remove_var("SNIPPETS_LOG_LEVEL");
        env::remove_var("SNIPPETS_ACTOR_ID");

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/snippets.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3001");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.actor_id, DEFAULT_ACTOR_ID);

        env::set_var("SNIPPETS_BIND_ADDR", "not-an-address");
        assert!(Config::from_env().is_err());
        env::remove_var("SNIPPETS_BIND_ADDR");
    }
}
