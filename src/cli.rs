//! Command-line interface definition for streamgate
//!
//! This module defines the CLI structure using clap's derive API. The
//! binary does one thing: serve the filter hooks, so there is no
//! subcommand tree.

use clap::Parser;

/// Streamgate - chat request filter
///
/// Tracks conversation identity across chat turns and relays
/// user-initiated stop signals to a backend LLM service.
#[derive(Parser, Debug, Clone)]
#[command(name = "streamgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the backend base URL from config
    #[arg(long, env = "STREAMGATE_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Address to bind the hook server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the hook server to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            backend_url: None,
            host: None,
            port: None,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_defaults() {
        let cli = Cli::parse_from(["streamgate"]);
        assert!(cli.config.is_none());
        assert!(cli.backend_url.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from([
            "streamgate",
            "--config",
            "custom.yaml",
            "--backend-url",
            "http://backend:8081",
            "--host",
            "0.0.0.0",
            "--port",
            "9090",
            "--verbose",
        ]);
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
        assert_eq!(cli.backend_url.as_deref(), Some("http://backend:8081"));
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(9090));
        assert!(cli.verbose);
    }
}
