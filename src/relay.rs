//! Backend stop relay
//!
//! Forwards a user-initiated stop for one stream to the backend LLM
//! service as a single HTTP POST. There is no retry, backoff, or circuit
//! breaking; a stop either lands or is reported back as a failure.

use crate::config::Valves;
use crate::error::{Result, StreamgateError};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// Payload of the outbound stop call
#[derive(Debug, Serialize)]
struct StopPayload<'a> {
    session_id: &'a str,
    chat_id: &'a str,
}

/// HTTP relay to the backend's stop handler
#[derive(Debug, Clone)]
pub struct BackendRelay {
    client: Client,
    stop_url: String,
}

impl BackendRelay {
    /// Build a relay from the configured valves
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(valves: &Valves) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(valves.stop_timeout_seconds))
            .build()
            .map_err(|e| StreamgateError::Relay(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            stop_url: format!("{}{}", valves.backend_url, valves.stop_endpoint),
        })
    }

    /// Full URL the relay posts stop requests to
    pub fn stop_url(&self) -> &str {
        &self.stop_url
    }

    /// Forward one stop request to the backend
    ///
    /// # Arguments
    ///
    /// * `session_id` - Session whose stream should be stopped
    /// * `chat_id` - Conversation the stream belongs to
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or answers with a
    /// non-200 status
    pub async fn send_stop(&self, session_id: &str, chat_id: &str) -> Result<()> {
        let payload = StopPayload {
            session_id,
            chat_id,
        };

        let response = self
            .client
            .post(&self.stop_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                StreamgateError::Relay(format!("Failed to reach backend: {}", e))
            })?;

        if response.status() != StatusCode::OK {
            return Err(
                StreamgateError::Relay(format!("Backend returned {}", response.status().as_u16()))
                    .into(),
            );
        }

        tracing::debug!(session_id, chat_id, "Forwarded stop to backend");
        Ok(())
    }
}
