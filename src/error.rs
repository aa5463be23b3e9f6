//! Error types for streamgate
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for streamgate operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, filter processing, and backend relay calls.
#[derive(Error, Debug)]
pub enum StreamgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend relay errors (stop forwarding failed)
    #[error("Relay error: {0}")]
    Relay(String),

    /// Stop request referenced a session the registry does not know
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Request body is not shaped like a chat request
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for streamgate operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
