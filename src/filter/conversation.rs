//! Conversation identifier resolver
//!
//! Maps a content hash of the conversation's opening user message to a
//! stable `chat_id`. Later turns append messages to the history, so only
//! the first user message is a stable key for the whole conversation.
//! Mappings live for the process lifetime; the table is never pruned,
//! which is a known limitation inherited from the source behavior.

use crate::error::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Process-lifetime table of conversation hash to chat_id
#[derive(Debug, Default)]
pub struct ConversationStore {
    chat_ids: RwLock<HashMap<String, String>>,
}

impl ConversationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash the message history down to a conversation key
    ///
    /// Only the first user message identifies the conversation; assistant
    /// turns and later user turns vary across requests within the same
    /// conversation. An empty or user-less history hashes the empty string.
    ///
    /// # Arguments
    ///
    /// * `messages` - The ordered message list from the request body
    ///
    /// # Returns
    ///
    /// Returns the SHA-256 hex digest identifying the conversation
    pub fn conversation_hash(messages: &[Value]) -> String {
        let content = messages
            .iter()
            .find(|message| message.get("role").and_then(Value::as_str) == Some("user"))
            .and_then(|message| message.get("content").and_then(Value::as_str))
            .unwrap_or("");

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up the chat_id for a conversation hash, minting one on first sight
    ///
    /// # Arguments
    ///
    /// * `conv_hash` - Conversation key from [`Self::conversation_hash`]
    ///
    /// # Returns
    ///
    /// Returns the stable chat_id for this conversation
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned
    pub fn resolve(&self, conv_hash: &str) -> Result<String> {
        if let Some(chat_id) = self
            .chat_ids
            .read()
            .map_err(|_| anyhow::anyhow!("conversation store lock poisoned"))?
            .get(conv_hash)
        {
            return Ok(chat_id.clone());
        }

        let mut chat_ids = self
            .chat_ids
            .write()
            .map_err(|_| anyhow::anyhow!("conversation store lock poisoned"))?;

        // A racing inlet may have minted the id between the two locks
        let chat_id = chat_ids
            .entry(conv_hash.to_string())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        Ok(chat_id)
    }

    /// Check whether a chat_id was previously issued by this store
    ///
    /// Used by inlet to honor a chat_id the caller already carries instead
    /// of re-deriving one from the message history.
    pub fn is_known(&self, chat_id: &str) -> bool {
        self.chat_ids
            .read()
            .map(|chat_ids| chat_ids.values().any(|known| known == chat_id))
            .unwrap_or(false)
    }

    /// Number of conversations tracked so far
    pub fn len(&self) -> usize {
        self.chat_ids.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether the store has seen any conversation yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
