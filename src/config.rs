//! Configuration management for streamgate
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, StreamgateError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure for streamgate
///
/// This structure holds all configuration needed for the filter,
/// including the valve settings exposed to the host front-end and
/// the listen address of the hook server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Filter valve settings (the host front-end's term for filter parameters)
    #[serde(default)]
    pub valves: Valves,

    /// Hook server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Valve settings for the filter
///
/// "Valve" is the host front-end's term for a configurable filter
/// parameter; the names here mirror what its admin UI exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Valves {
    /// Filter priority relative to other filters in the host
    #[serde(default)]
    pub priority: i32,

    /// Base URL of the backend LLM service
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Path of the backend's stop handler, appended to `backend_url`
    #[serde(default = "default_stop_endpoint")]
    pub stop_endpoint: String,

    /// Timeout for the outbound stop call (seconds)
    #[serde(default = "default_stop_timeout_seconds")]
    pub stop_timeout_seconds: u64,

    /// Age after which inactive stream entries are dropped (seconds)
    #[serde(default = "default_cleanup_horizon_seconds")]
    pub cleanup_horizon_seconds: i64,
}

fn default_backend_url() -> String {
    "http://host.docker.internal:8081".to_string()
}

fn default_stop_endpoint() -> String {
    "/stop".to_string()
}

fn default_stop_timeout_seconds() -> u64 {
    5
}

fn default_cleanup_horizon_seconds() -> i64 {
    3600
}

impl Default for Valves {
    fn default() -> Self {
        Self {
            priority: 0,
            backend_url: default_backend_url(),
            stop_endpoint: default_stop_endpoint(),
            stop_timeout_seconds: default_stop_timeout_seconds(),
            cleanup_horizon_seconds: default_cleanup_horizon_seconds(),
        }
    }
}

/// Hook server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the hook server to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the hook server to
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8089
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StreamgateError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| StreamgateError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(backend_url) = std::env::var("STREAMGATE_BACKEND_URL") {
            self.valves.backend_url = backend_url;
        }

        if let Ok(stop_endpoint) = std::env::var("STREAMGATE_STOP_ENDPOINT") {
            self.valves.stop_endpoint = stop_endpoint;
        }

        if let Ok(priority) = std::env::var("STREAMGATE_PRIORITY") {
            if let Ok(value) = priority.parse() {
                self.valves.priority = value;
            } else {
                tracing::warn!("Invalid STREAMGATE_PRIORITY: {}", priority);
            }
        }

        if let Ok(timeout) = std::env::var("STREAMGATE_STOP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.valves.stop_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid STREAMGATE_STOP_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(host) = std::env::var("STREAMGATE_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("STREAMGATE_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid STREAMGATE_PORT: {}", port);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(backend_url) = &cli.backend_url {
            self.valves.backend_url = backend_url.clone();
        }

        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }

        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the backend URL is empty or unparsable, if the
    /// stop endpoint is not an absolute path, or if the stop timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.valves.backend_url.is_empty() {
            return Err(StreamgateError::Config("backend_url must not be empty".to_string()).into());
        }

        Url::parse(&self.valves.backend_url).map_err(|e| {
            StreamgateError::Config(format!(
                "Invalid backend_url '{}': {}",
                self.valves.backend_url, e
            ))
        })?;

        if !self.valves.stop_endpoint.starts_with('/') {
            return Err(StreamgateError::Config(format!(
                "stop_endpoint must start with '/', got '{}'",
                self.valves.stop_endpoint
            ))
            .into());
        }

        if self.valves.stop_timeout_seconds == 0 {
            return Err(
                StreamgateError::Config("stop_timeout_seconds must be positive".to_string())
                    .into(),
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            valves: Valves::default(),
            server: ServerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_valves() {
        let valves = Valves::default();
        assert_eq!(valves.priority, 0);
        assert_eq!(valves.backend_url, "http://host.docker.internal:8081");
        assert_eq!(valves.stop_endpoint, "/stop");
        assert_eq!(valves.stop_timeout_seconds, 5);
        assert_eq!(valves.cleanup_horizon_seconds, 3600);
    }

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 8089);
    }

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_backend_url() {
        let mut config = Config::default();
        config.valves.backend_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unparsable_backend_url() {
        let mut config = Config::default();
        config.valves.backend_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_stop_endpoint() {
        let mut config = Config::default();
        config.valves.stop_endpoint = "stop".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_stop_timeout() {
        let mut config = Config::default();
        config.valves.stop_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_parses_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "valves:\n  backend_url: http://localhost:9000\nserver:\n  port: 9090"
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.valves.backend_url, "http://localhost:9000");
        // Unset fields fall back to serde defaults
        assert_eq!(config.valves.stop_endpoint, "/stop");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_from_file_rejects_malformed_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "valves: [not, a, mapping").unwrap();

        let result = Config::from_file(file.path().to_str().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_take_effect() {
        let cli = crate::cli::Cli {
            config: None,
            backend_url: Some("http://override:8081".to_string()),
            host: Some("0.0.0.0".to_string()),
            port: Some(9999),
            verbose: false,
        };

        let mut config = Config::default();
        config.apply_cli_overrides(&cli);
        assert_eq!(config.valves.backend_url, "http://override:8081");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.valves.backend_url, config.valves.backend_url);
        assert_eq!(parsed.server.port, config.server.port);
    }
}
