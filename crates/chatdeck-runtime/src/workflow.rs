//! Session workflow: first message creates a session, later messages are
//! appended to the active one.
//!
//! Every gateway call races the caller's [`CancellationToken`]. A
//! cancelled call writes nothing to the transcript store.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use chatdeck_core::chat::{ChatMessage, Role, SessionSummary, session_name_from, sort_messages};
use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::gateway::{ChatGateway, GatewayError};
use crate::kv_store::StorageError;
use crate::transcript_store::ChatTranscriptStore;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("transcript storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("message is empty")]
    EmptyMessage,
    #[error("no active session")]
    NoActiveSession,
    #[error("request cancelled")]
    Cancelled,
}

impl WorkflowError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            WorkflowError::Cancelled | WorkflowError::Gateway(GatewayError::Cancelled)
        )
    }
}

/// Outcome of one submitted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub session_id: String,
    /// Index entry when this message started a new session.
    pub created: Option<SessionSummary>,
    /// Messages that were not stored before this exchange, oldest first.
    pub new_messages: Vec<ChatMessage>,
}

impl Exchange {
    /// Assistant messages among the new ones.
    pub fn replies(&self) -> impl Iterator<Item = &ChatMessage> {
        self.new_messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
    }
}

/// Drives the gateway and records results in the transcript store.
pub struct ChatWorkflow {
    gateway: Arc<dyn ChatGateway>,
    store: ChatTranscriptStore,
}

impl std::fmt::Debug for ChatWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWorkflow")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ChatWorkflow {
    #[must_use]
    pub fn new(gateway: Arc<dyn ChatGateway>, store: ChatTranscriptStore) -> Self {
        Self { gateway, store }
    }

    #[must_use]
    pub fn store(&self) -> &ChatTranscriptStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChatTranscriptStore {
        &mut self.store
    }

    /// Send `text` to the active session, or start one if none is active.
    pub async fn submit(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Exchange, WorkflowError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WorkflowError::EmptyMessage);
        }
        match self.store.active_session() {
            Some(id) => self.send_to(&id, text, cancel).await,
            None => self.start_session(text, cancel).await,
        }
    }

    /// Create a session seeded with `text` and make it active.
    pub async fn start_session(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Exchange, WorkflowError> {
        let created = race(cancel, self.gateway.create_session(text)).await?;
        let session_id = created.session_id;
        let mut messages = created.messages;
        sort_messages(&mut messages);

        // Last remote call; nothing is stored until it settles.
        let name = session_name_from(&messages);
        if let Err(err) = race(cancel, self.gateway.create_history_entry(&session_id, &name)).await
        {
            if err.is_cancelled() {
                return Err(err);
            }
            tracing::warn!(session = %session_id, error = %err, "history entry not registered");
        }

        self.store.merge_messages(&session_id, &messages)?;
        let summary = self
            .store
            .add_session(&session_id, &messages, Utc::now())?;
        self.store.set_active(&session_id)?;

        Ok(Exchange {
            session_id,
            created: summary,
            new_messages: messages,
        })
    }

    /// Append `text` to the active session.
    pub async fn send_to_active(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Exchange, WorkflowError> {
        let id = self
            .store
            .active_session()
            .ok_or(WorkflowError::NoActiveSession)?;
        self.send_to(&id, text, cancel).await
    }

    async fn send_to(
        &mut self,
        session_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Exchange, WorkflowError> {
        let user_id = self.store.user_id()?;
        let receipt = race(cancel, self.gateway.send_message(session_id, text, &user_id)).await?;
        tracing::debug!(session = %session_id, status = ?receipt.status, "message sent");

        let remote = race(cancel, self.gateway.list_messages(session_id)).await?;
        let known: HashSet<String> = self
            .store
            .messages(session_id)
            .into_iter()
            .map(|m| m.id)
            .collect();
        let mut new_messages: Vec<ChatMessage> = remote
            .into_iter()
            .filter(|m| !known.contains(&m.id))
            .collect();
        sort_messages(&mut new_messages);
        self.store.merge_messages(session_id, &new_messages)?;

        Ok(Exchange {
            session_id: session_id.to_string(),
            created: None,
            new_messages,
        })
    }
}

async fn race<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, WorkflowError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(WorkflowError::Cancelled),
        result = call => Ok(result?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CreatedSession, SendReceipt};
    use crate::kv_store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted {
        remote: Mutex<Vec<ChatMessage>>,
        history: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChatGateway for Scripted {
        async fn create_session(&self, first: &str) -> Result<CreatedSession, GatewayError> {
            let messages = vec![
                ChatMessage::user("m1", first, 1),
                ChatMessage::assistant("m2", "hello", 2),
            ];
            *self.remote.lock().unwrap() = messages.clone();
            Ok(CreatedSession {
                session_id: "t1".into(),
                messages,
            })
        }

        async fn send_message(
            &self,
            _session_id: &str,
            text: &str,
            _user_id: &str,
        ) -> Result<SendReceipt, GatewayError> {
            let mut remote = self.remote.lock().unwrap();
            let n = remote.len() as i64;
            remote.push(ChatMessage::user(format!("m{}", n + 1), text, n + 1));
            remote.push(ChatMessage::assistant(format!("m{}", n + 2), "ok", n + 2));
            Ok(SendReceipt::default())
        }

        async fn list_messages(&self, _session_id: &str) -> Result<Vec<ChatMessage>, GatewayError> {
            Ok(self.remote.lock().unwrap().clone())
        }

        async fn create_history_entry(&self, id: &str, name: &str) -> Result<(), GatewayError> {
            self.history
                .lock()
                .unwrap()
                .push((id.to_string(), name.to_string()));
            Ok(())
        }
    }

    fn workflow(gateway: Arc<Scripted>) -> ChatWorkflow {
        ChatWorkflow::new(gateway, ChatTranscriptStore::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn first_message_creates_and_activates_session() {
        let gateway = Arc::new(Scripted::default());
        let mut flow = workflow(Arc::clone(&gateway));
        let exchange = flow
            .submit("  plan a trip  ", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(exchange.session_id, "t1");
        assert_eq!(exchange.created.as_ref().unwrap().display_name, "plan a trip");
        assert_eq!(exchange.replies().count(), 1);
        assert_eq!(flow.store().active_session().as_deref(), Some("t1"));
        assert_eq!(flow.store().messages("t1").len(), 2);
        assert_eq!(
            gateway.history.lock().unwrap().as_slice(),
            &[("t1".to_string(), "plan a trip".to_string())]
        );
    }

    #[tokio::test]
    async fn follow_up_only_reports_unseen_messages() {
        let gateway = Arc::new(Scripted::default());
        let mut flow = workflow(gateway);
        let token = CancellationToken::new();
        flow.submit("first", &token).await.unwrap();
        let exchange = flow.submit("second", &token).await.unwrap();
        assert!(exchange.created.is_none());
        let ids: Vec<&str> = exchange.new_messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m3", "m4"]);
        assert_eq!(flow.store().messages("t1").len(), 4);
    }

    #[tokio::test]
    async fn blank_text_and_missing_session_are_rejected() {
        let mut flow = workflow(Arc::new(Scripted::default()));
        let token = CancellationToken::new();
        assert!(matches!(
            flow.submit("   ", &token).await,
            Err(WorkflowError::EmptyMessage)
        ));
        assert!(matches!(
            flow.send_to_active("hi", &token).await,
            Err(WorkflowError::NoActiveSession)
        ));
    }

    /// Stops the caller while the history entry is being registered.
    struct StopsDuringHistory {
        token: CancellationToken,
    }

    #[async_trait]
    impl ChatGateway for StopsDuringHistory {
        async fn create_session(&self, first: &str) -> Result<CreatedSession, GatewayError> {
            Ok(CreatedSession {
                session_id: "t1".into(),
                messages: vec![ChatMessage::user("m1", first, 1)],
            })
        }

        async fn send_message(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<SendReceipt, GatewayError> {
            Ok(SendReceipt::default())
        }

        async fn list_messages(&self, _: &str) -> Result<Vec<ChatMessage>, GatewayError> {
            Ok(Vec::new())
        }

        async fn create_history_entry(&self, _: &str, _: &str) -> Result<(), GatewayError> {
            self.token.cancel();
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn stop_during_history_registration_writes_nothing() {
        let token = CancellationToken::new();
        let gateway = Arc::new(StopsDuringHistory {
            token: token.clone(),
        });
        let mut flow =
            ChatWorkflow::new(gateway, ChatTranscriptStore::new(Arc::new(MemoryStore::new())));
        let err = flow.submit("hello", &token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(flow.store().list_sessions().is_empty());
        assert_eq!(flow.store().active_session(), None);
        assert!(flow.store().messages("t1").is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_writes_nothing() {
        let mut flow = workflow(Arc::new(Scripted::default()));
        let token = CancellationToken::new();
        token.cancel();
        let err = flow.submit("hello", &token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(flow.store().list_sessions().is_empty());
        assert_eq!(flow.store().active_session(), None);
    }
}
