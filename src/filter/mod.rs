//! Request-interception filter
//!
//! The filter sits between a chat front-end and a backend LLM service. On
//! the way in it stamps every chat turn with a stable conversation id and
//! a per-turn session id; on the way out it retires finished streams; and
//! on a user stop it forwards the signal to the backend exactly once.

pub mod conversation;
pub mod streams;

use crate::config::Valves;
use crate::error::{Result, StreamgateError};
use crate::relay::BackendRelay;
use conversation::ConversationStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use streams::StreamRegistry;

/// Outcome of a stop request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Backend acknowledged the stop
    Stopped,
    /// The registry has no entry for the session
    UnknownSession,
    /// The backend was unreachable or refused the stop
    RelayFailed(String),
}

/// Response body returned to the host front-end for a stop request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StopResponse {
    /// "success" or "error"
    pub status: String,
    /// Human-readable description of the outcome
    pub message: String,
}

impl StopOutcome {
    /// Render the outcome as the response body the front-end expects
    pub fn to_response(&self) -> StopResponse {
        match self {
            StopOutcome::Stopped => StopResponse {
                status: "success".to_string(),
                message: "Stream stopped".to_string(),
            },
            StopOutcome::UnknownSession => StopResponse {
                status: "error".to_string(),
                message: "Session not found".to_string(),
            },
            StopOutcome::RelayFailed(reason) => StopResponse {
                status: "error".to_string(),
                message: reason.clone(),
            },
        }
    }
}

/// Stateful chat request filter
///
/// Owns the conversation table, the active stream registry, and the
/// backend relay. All state is in-memory and lives for the process
/// lifetime only.
#[derive(Debug)]
pub struct Filter {
    conversations: ConversationStore,
    streams: StreamRegistry,
    relay: BackendRelay,
    cleanup_horizon_seconds: i64,
}

impl Filter {
    /// Build a filter from the configured valves
    ///
    /// # Errors
    ///
    /// Returns error if the backend relay cannot be constructed
    pub fn new(valves: &Valves) -> Result<Self> {
        Ok(Self {
            conversations: ConversationStore::new(),
            streams: StreamRegistry::new(),
            relay: BackendRelay::new(valves)?,
            cleanup_horizon_seconds: valves.cleanup_horizon_seconds,
        })
    }

    /// Inlet hook: stamp the request body with chat_id and session_id
    ///
    /// The body is a JSON object; fields the filter does not know about
    /// pass through untouched. A chat_id already present in the body is
    /// honored if this process issued it, otherwise the id is derived
    /// from the message history. A missing session_id is minted.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not a JSON object
    pub fn inlet(&self, mut body: Value) -> Result<Value> {
        let object = body.as_object_mut().ok_or_else(|| {
            StreamgateError::InvalidBody("inlet body must be a JSON object".to_string())
        })?;

        // Opportunistic eviction of long-dead streams
        let removed = self.streams.cleanup(self.cleanup_horizon_seconds);
        if removed > 0 {
            tracing::debug!(removed, "Evicted stale stream entries");
        }

        let messages = object
            .get("messages")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let conv_hash = ConversationStore::conversation_hash(&messages);

        let provided_chat_id = object
            .get("chat_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let chat_id = match provided_chat_id {
            Some(id) if self.conversations.is_known(&id) => id,
            _ => self.conversations.resolve(&conv_hash)?,
        };
        object.insert("chat_id".to_string(), Value::String(chat_id.clone()));

        let session_id = match object.get("session_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = self.streams.mint_session_id();
                object.insert("session_id".to_string(), Value::String(id.clone()));
                id
            }
        };

        self.streams.register(&session_id, &chat_id)?;
        tracing::debug!(session_id, chat_id, "Registered stream on inlet");

        Ok(body)
    }

    /// Outlet hook: retire streams whose response has finished
    ///
    /// Only a terminal body (`done: true` or a non-null `stop_reason`)
    /// deactivates the stream; intermediate outlet calls pass through.
    /// The body is returned unchanged either way.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not a JSON object
    pub fn outlet(&self, body: Value) -> Result<Value> {
        let object = body.as_object().ok_or_else(|| {
            StreamgateError::InvalidBody("outlet body must be a JSON object".to_string())
        })?;

        if let Some(session_id) = object.get("session_id").and_then(Value::as_str) {
            let done = object.get("done").and_then(Value::as_bool).unwrap_or(false);
            let stop_reason = object
                .get("stop_reason")
                .map(|reason| !reason.is_null())
                .unwrap_or(false);

            if (done || stop_reason) && self.streams.finish(session_id) {
                tracing::debug!(session_id, "Stream finished on outlet");
            }
        }

        Ok(body)
    }

    /// Stop hook: forward a user-initiated stop to the backend
    ///
    /// An unknown session is a failure, not a panic. A known session
    /// triggers exactly one outbound POST; on success the stream is
    /// marked as stopped by the user.
    pub async fn handle_stop(&self, session_id: &str) -> StopOutcome {
        let Some(state) = self.streams.get(session_id) else {
            tracing::warn!(session_id, "Stop requested for unknown session");
            return StopOutcome::UnknownSession;
        };

        match self.relay.send_stop(session_id, &state.chat_id).await {
            Ok(()) => {
                self.streams.mark_stopped(session_id);
                tracing::info!(session_id, chat_id = %state.chat_id, "Stream stopped by user");
                StopOutcome::Stopped
            }
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Stop relay failed");
                StopOutcome::RelayFailed(e.to_string())
            }
        }
    }

    /// Snapshot of a session's stream state, if tracked
    pub fn stream_state(&self, session_id: &str) -> Option<streams::StreamState> {
        self.streams.get(session_id)
    }

    /// Number of conversations seen so far
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}
