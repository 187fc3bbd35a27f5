//! Chat sessions and their messages on top of a [`KeyValueStore`].
//!
//! # Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `active_thread_id` | id of the active session (JSON string) |
//! | `chat_{id}_messages` | message list of one session |
//! | `chat_history` | session index (`SessionSummary` list) |
//! | `user_id` | persistent anonymous user id |
//!
//! # Invariants
//!
//! - Session ids in the index are unique.
//! - The active id is either absent or names an indexed session. Deleting
//!   the active session clears it; reads ignore a dangling value.
//! - Message lists never hold two messages with the same id.
//!
//! Writes to different keys are independent; there is no cross-key
//! transaction.

use std::sync::Arc;

use chatdeck_core::chat::{
    ChatMessage, ChatSession, SessionSummary, session_name_from, sort_messages,
};
use chatdeck_core::notify::{Notifier, SubscriptionId};
use chrono::{DateTime, Utc};

use crate::kv_store::{KeyValueStore, StorageResult, load_json, save_json};

pub const ACTIVE_SESSION_KEY: &str = "active_thread_id";
pub const SESSION_INDEX_KEY: &str = "chat_history";
pub const USER_ID_KEY: &str = "user_id";

/// Key holding the message list of session `id`.
#[must_use]
pub fn messages_key(id: &str) -> String {
    format!("chat_{id}_messages")
}

/// Session index and transcripts.
pub struct ChatTranscriptStore {
    store: Arc<dyn KeyValueStore>,
    listeners: Notifier<SessionSummary>,
}

impl std::fmt::Debug for ChatTranscriptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTranscriptStore")
            .field("store", &self.store.name())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ChatTranscriptStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            listeners: Notifier::new(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // ── active session ──

    /// Active session id, if it names an indexed session.
    #[must_use]
    pub fn active_session(&self) -> Option<String> {
        let id: String = load_json(self.store.as_ref(), ACTIVE_SESSION_KEY)?;
        if self.contains(&id) {
            Some(id)
        } else {
            tracing::debug!(session = %id, "ignoring dangling active session id");
            None
        }
    }

    /// Make `id` active. Returns `false` (and changes nothing) when the
    /// session is not indexed.
    pub fn set_active(&self, id: &str) -> StorageResult<bool> {
        if !self.contains(id) {
            return Ok(false);
        }
        save_json(self.store.as_ref(), ACTIVE_SESSION_KEY, id)?;
        Ok(true)
    }

    /// Forget the active session (start a new chat on next send).
    pub fn clear_active(&self) -> StorageResult<()> {
        self.store.remove(ACTIVE_SESSION_KEY)
    }

    /// Switch to a saved session. Unknown ids are logged and rejected.
    pub fn switch_to(&self, id: &str) -> StorageResult<bool> {
        let switched = self.set_active(id)?;
        if switched {
            tracing::info!(session = %id, "switched session");
        } else {
            tracing::warn!(session = %id, "session not found in history");
        }
        Ok(switched)
    }

    // ── messages ──

    /// Messages of a session sorted by creation time.
    #[must_use]
    pub fn messages(&self, id: &str) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> =
            load_json(self.store.as_ref(), &messages_key(id)).unwrap_or_default();
        sort_messages(&mut messages);
        messages
    }

    /// Append messages whose ids are not stored yet. Returns how many were
    /// added.
    pub fn merge_messages(&self, id: &str, incoming: &[ChatMessage]) -> StorageResult<usize> {
        let key = messages_key(id);
        let mut stored: Vec<ChatMessage> =
            load_json(self.store.as_ref(), &key).unwrap_or_default();
        let before = stored.len();
        for message in incoming {
            if !stored.iter().any(|m| m.id == message.id) {
                stored.push(message.clone());
            }
        }
        let added = stored.len() - before;
        if added > 0 || before == 0 {
            save_json(self.store.as_ref(), &key, &stored)?;
        }
        tracing::debug!(session = %id, added, total = stored.len(), "merged messages");
        Ok(added)
    }

    // ── index ──

    fn index(&self) -> Vec<SessionSummary> {
        load_json(self.store.as_ref(), SESSION_INDEX_KEY).unwrap_or_default()
    }

    fn save_index(&self, index: &[SessionSummary]) -> StorageResult<()> {
        save_json(self.store.as_ref(), SESSION_INDEX_KEY, index)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index().iter().any(|s| s.id == id)
    }

    /// Index a new session, named after its first user message.
    ///
    /// Returns `None` when the id is already indexed. Subscribers are
    /// notified of new entries only.
    pub fn add_session(
        &mut self,
        id: &str,
        messages: &[ChatMessage],
        created_at: DateTime<Utc>,
    ) -> StorageResult<Option<SessionSummary>> {
        let mut index = self.index();
        if index.iter().any(|s| s.id == id) {
            return Ok(None);
        }
        let summary = SessionSummary {
            id: id.to_string(),
            display_name: session_name_from(messages),
            created_at,
        };
        index.push(summary.clone());
        self.save_index(&index)?;
        tracing::info!(session = %id, name = %summary.display_name, "session added");
        self.listeners.emit(&summary);
        Ok(Some(summary))
    }

    /// All sessions, newest first.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut index = self.index();
        index.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        index
    }

    /// A session with its messages.
    #[must_use]
    pub fn get_session(&self, id: &str) -> Option<ChatSession> {
        let summary = self.index().into_iter().find(|s| s.id == id)?;
        Some(ChatSession {
            messages: self.messages(id),
            id: summary.id,
            created_at: summary.created_at,
            display_name: summary.display_name,
        })
    }

    /// Rename a session. Returns `false` for unknown ids.
    pub fn rename_session(&self, id: &str, name: &str) -> StorageResult<bool> {
        let mut index = self.index();
        let Some(entry) = index.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        entry.display_name = name.to_string();
        self.save_index(&index)?;
        Ok(true)
    }

    /// Delete a session and its messages. Clears the active id if it
    /// pointed here.
    pub fn delete_session(&self, id: &str) -> StorageResult<bool> {
        let was_active = self.active_session().as_deref() == Some(id);
        let mut index = self.index();
        let before = index.len();
        index.retain(|s| s.id != id);
        if index.len() == before {
            return Ok(false);
        }
        if was_active {
            self.clear_active()?;
        }
        self.save_index(&index)?;
        self.store.remove(&messages_key(id))?;
        tracing::info!(session = %id, was_active, "session deleted");
        Ok(true)
    }

    // ── user ──

    /// Persistent user id, generated on first use.
    pub fn user_id(&self) -> StorageResult<String> {
        if let Some(id) = load_json::<String>(self.store.as_ref(), USER_ID_KEY) {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string();
        save_json(self.store.as_ref(), USER_ID_KEY, &id)?;
        Ok(id)
    }

    // ── notifications ──

    /// Listen for newly indexed sessions.
    pub fn subscribe(&mut self, listener: impl FnMut(&SessionSummary) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
