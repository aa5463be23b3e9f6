//! Active stream registry
//!
//! Tracks one entry per in-flight chat turn, keyed by session_id. Entries
//! are created on inlet, deactivated by a terminal outlet or a user stop,
//! and dropped opportunistically once they have been inactive longer than
//! the configured horizon.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// State of one chat turn's stream
#[derive(Debug, Clone)]
pub struct StreamState {
    /// Conversation this stream belongs to
    pub chat_id: String,
    /// Whether the stream is still in flight
    pub active: bool,
    /// When the inlet registered this stream
    pub started_at: DateTime<Utc>,
    /// When the stream was deactivated, if it has been
    pub ended_at: Option<DateTime<Utc>>,
    /// Whether deactivation came from a user stop rather than completion
    pub stopped_by_user: bool,
}

/// Registry of active streams keyed by session_id
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: RwLock<HashMap<String, StreamState>>,
    next_seq: AtomicU64,
}

impl StreamRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a session_id for a chat turn that arrived without one
    ///
    /// The id is timestamp-derived for readability; the sequence suffix
    /// keeps ids unique when two turns land within the same second.
    pub fn mint_session_id(&self) -> String {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        format!("session-{}-{}", Utc::now().timestamp(), seq)
    }

    /// Record a new active stream for a session
    ///
    /// Re-registering an existing session_id resets its entry; the host
    /// front-end reuses session ids when the user retries a turn.
    ///
    /// # Errors
    ///
    /// Returns error if the registry lock is poisoned
    pub fn register(&self, session_id: &str, chat_id: &str) -> Result<()> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| anyhow::anyhow!("stream registry lock poisoned"))?;
        streams.insert(
            session_id.to_string(),
            StreamState {
                chat_id: chat_id.to_string(),
                active: true,
                started_at: Utc::now(),
                ended_at: None,
                stopped_by_user: false,
            },
        );
        Ok(())
    }

    /// Fetch a snapshot of a session's stream state
    pub fn get(&self, session_id: &str) -> Option<StreamState> {
        self.streams
            .read()
            .ok()
            .and_then(|streams| streams.get(session_id).cloned())
    }

    /// Deactivate a stream that ran to completion
    ///
    /// Returns whether the session was known.
    pub fn finish(&self, session_id: &str) -> bool {
        self.deactivate(session_id, false)
    }

    /// Deactivate a stream after a successful user stop
    ///
    /// Returns whether the session was known.
    pub fn mark_stopped(&self, session_id: &str) -> bool {
        self.deactivate(session_id, true)
    }

    fn deactivate(&self, session_id: &str, stopped_by_user: bool) -> bool {
        let Ok(mut streams) = self.streams.write() else {
            return false;
        };
        match streams.get_mut(session_id) {
            Some(state) => {
                state.active = false;
                state.ended_at = Some(Utc::now());
                if stopped_by_user {
                    state.stopped_by_user = true;
                }
                true
            }
            None => false,
        }
    }

    /// Drop inactive entries that ended longer than `horizon_seconds` ago
    ///
    /// Active streams are never evicted. Returns the number of entries
    /// removed.
    pub fn cleanup(&self, horizon_seconds: i64) -> usize {
        let Ok(mut streams) = self.streams.write() else {
            return 0;
        };
        let cutoff = Utc::now() - Duration::seconds(horizon_seconds);
        let before = streams.len();
        streams.retain(|_, state| {
            state.active || state.ended_at.map(|ended| ended > cutoff).unwrap_or(true)
        });
        before - streams.len()
    }

    /// Number of tracked streams, active or not
    pub fn len(&self) -> usize {
        self.streams.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether the registry is tracking any stream
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_session_ids_are_unique() {
        let registry = StreamRegistry::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(registry.mint_session_id()));
        }
    }

    #[test]
    fn test_minted_session_ids_are_timestamp_prefixed() {
        let registry = StreamRegistry::new();
        let id = registry.mint_session_id();
        assert!(id.starts_with("session-"));
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
    }

    #[test]
    fn test_register_and_get() {
        let registry = StreamRegistry::new();
        registry.register("session-1", "chat-a").unwrap();

        let state = registry.get("session-1").unwrap();
        assert_eq!(state.chat_id, "chat-a");
        assert!(state.active);
        assert!(state.ended_at.is_none());
        assert!(!state.stopped_by_user);
    }

    #[test]
    fn test_get_unknown_session() {
        let registry = StreamRegistry::new();
        assert!(registry.get("session-missing").is_none());
    }

    #[test]
    fn test_finish_deactivates() {
        let registry = StreamRegistry::new();
        registry.register("session-1", "chat-a").unwrap();

        assert!(registry.finish("session-1"));
        let state = registry.get("session-1").unwrap();
        assert!(!state.active);
        assert!(state.ended_at.is_some());
        assert!(!state.stopped_by_user);
    }

    #[test]
    fn test_mark_stopped_records_user_stop() {
        let registry = StreamRegistry::new();
        registry.register("session-1", "chat-a").unwrap();

        assert!(registry.mark_stopped("session-1"));
        let state = registry.get("session-1").unwrap();
        assert!(!state.active);
        assert!(state.stopped_by_user);
    }

    #[test]
    fn test_deactivate_unknown_session_is_noop() {
        let registry = StreamRegistry::new();
        assert!(!registry.finish("session-missing"));
        assert!(!registry.mark_stopped("session-missing"));
    }

    #[test]
    fn test_cleanup_drops_only_stale_inactive_entries() {
        let registry = StreamRegistry::new();
        registry.register("stale", "chat-a").unwrap();
        registry.register("fresh", "chat-b").unwrap();
        registry.register("running", "chat-c").unwrap();

        registry.finish("stale");
        registry.finish("fresh");

        // Backdate the stale entry past the horizon
        {
            let mut streams = registry.streams.write().unwrap();
            streams.get_mut("stale").unwrap().ended_at =
                Some(Utc::now() - Duration::seconds(7200));
        }

        let removed = registry.cleanup(3600);
        assert_eq!(removed, 1);
        assert!(registry.get("stale").is_none());
        assert!(registry.get("fresh").is_some());
        assert!(registry.get("running").is_some());
    }

    #[test]
    fn test_cleanup_never_evicts_active_streams() {
        let registry = StreamRegistry::new();
        registry.register("running", "chat-a").unwrap();

        {
            let mut streams = registry.streams.write().unwrap();
            streams.get_mut("running").unwrap().started_at = Utc::now() - Duration::seconds(7200);
        }

        assert_eq!(registry.cleanup(3600), 0);
        assert!(registry.get("running").unwrap().active);
    }
}
