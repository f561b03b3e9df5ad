//! Configuration management for the SQLite read-only MCP server.
//!
//! Configuration is loaded from environment variables following the 12-factor app pattern.

use crate::error::ServerError;
use crate::transport::TransportConfig;
use std::path::PathBuf;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database file configuration
    pub database: DatabaseConfig,

    /// Transport selection and HTTP settings
    pub transport: TransportConfig,
}

/// Database file configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

impl DatabaseConfig {
    /// Create a configuration for the given database file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the database path from `DB_FILE`.
    pub fn from_env() -> Result<Self, ServerError> {
        match std::env::var("DB_FILE") {
            Ok(path) if !path.is_empty() => Ok(Self::new(path)),
            _ => Err(ServerError::config("DB_FILE environment variable not set")),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DB_FILE`: Path to the SQLite database file (required)
    /// - `MCP_TRANSPORT`: `http` (default) or `stdio`
    /// - `MCP_HOST`: HTTP bind host (default: 0.0.0.0)
    /// - `PORT`: HTTP port (default: 8080)
    /// - `MCP_HTTP_TRACING`: Trace HTTP requests (default: true)
    pub fn from_env() -> Result<Self, ServerError> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            transport: TransportConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportType;
    use serial_test::serial;

    fn clear_env() {
        for key in ["DB_FILE", "PORT", "MCP_HOST", "MCP_TRANSPORT", "MCP_HTTP_TRACING"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_missing_db_file() {
        clear_env();
        let err = Config::from_env().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("DB_FILE environment variable not set"));

        std::env::set_var("DB_FILE", "");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        std::env::set_var("DB_FILE", "/data/app.db");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database.path, PathBuf::from("/data/app.db"));
        assert_eq!(config.transport.http.port, 8080);
        assert_eq!(config.transport.http.host, "0.0.0.0");
        assert!(config.transport.http.enable_tracing);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("DB_FILE", "app.db");
        std::env::set_var("PORT", "9090");
        std::env::set_var("MCP_HOST", "127.0.0.1");
        std::env::set_var("MCP_TRANSPORT", "stdio");
        std::env::set_var("MCP_HTTP_TRACING", "false");

        let config = Config::from_env().unwrap();
        assert_eq!(config.transport.http.port, 9090);
        assert_eq!(config.transport.http.host, "127.0.0.1");
        assert_eq!(config.transport.transport_type, TransportType::Stdio);
        assert!(!config.transport.http.enable_tracing);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparsable_port_uses_default() {
        clear_env();
        std::env::set_var("DB_FILE", "app.db");
        std::env::set_var("PORT", "eighty");

        let config = Config::from_env().unwrap();
        assert_eq!(config.transport.http.port, 8080);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_transport() {
        clear_env();
        std::env::set_var("DB_FILE", "app.db");
        std::env::set_var("MCP_TRANSPORT", "smoke-signals");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        clear_env();
    }
}
