//! Hosted chat API client.
//!
//! [`ChatGateway`] is the seam the workflow talks to; [`HttpChatGateway`]
//! is the reqwest implementation. Calls are plain request/response with a
//! static `x-api-key` header. There are no retries.

use async_trait::async_trait;
use chatdeck_core::chat::ChatMessage;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GatewayConfig;

/// Value sent as `source` when registering a history entry.
pub const HISTORY_SOURCE: &str = "Frontend-Custom";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway transport failed: {0}")]
    Transport(String),
    #[error("gateway returned http {status}: {body}")]
    Status { status: u16, body: String },
    #[error("gateway response could not be decoded: {0}")]
    Decode(String),
    #[error("gateway response is missing `{0}`")]
    MissingField(&'static str),
    #[error("gateway request cancelled")]
    Cancelled,
}

/// Result of creating a session with its first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

/// Acknowledgement of a sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub status: Option<String>,
}

/// Remote chat service.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Start a session seeded with `first_message`.
    async fn create_session(&self, first_message: &str) -> Result<CreatedSession, GatewayError>;

    /// Post a user message to an existing session.
    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        user_id: &str,
    ) -> Result<SendReceipt, GatewayError>;

    /// Full message list of a session.
    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, GatewayError>;

    /// Register a session in the server-side history.
    async fn create_history_entry(&self, session_id: &str, name: &str) -> Result<(), GatewayError>;
}

// ─── wire types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    agent_id: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    content: &'a str,
    role: &'static str,
}

#[derive(Debug, Serialize)]
struct HistoryEntryRequest<'a> {
    agent_id: &'a str,
    thread_id: &'a str,
    name: &'a str,
    source: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPayload {
    thread_id: Option<String>,
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

/// `create_session` replies either `{"response": {...}}` or the payload
/// itself.
#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    response: Option<SessionPayload>,
    #[serde(flatten)]
    flat: SessionPayload,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: Option<serde_json::Value>,
}

// ─── http implementation ────────────────────────────────────────────────

/// reqwest-backed [`ChatGateway`].
#[derive(Debug, Clone)]
pub struct HttpChatGateway {
    config: GatewayConfig,
    http: reqwest::Client,
}

impl HttpChatGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn post_json<Req, Res>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        payload: &Req,
    ) -> Result<Res, GatewayError>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(self.config.endpoint(path))
            .header("x-api-key", &self.config.api_key)
            .query(query)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        decode_json_response(response).await
    }

    async fn get_json<Res>(&self, path: &str) -> Result<Res, GatewayError>
    where
        Res: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .get(self.config.endpoint(path))
            .header("x-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        decode_json_response(response).await
    }
}

#[async_trait]
impl ChatGateway for HttpChatGateway {
    async fn create_session(&self, first_message: &str) -> Result<CreatedSession, GatewayError> {
        let body = CreateSessionRequest {
            agent_id: &self.config.agent_id,
            message: first_message,
        };
        let reply: CreateSessionResponse = self.post_json("createchat", &[], &body).await?;
        let payload = reply.response.unwrap_or(reply.flat);
        let session_id = payload
            .thread_id
            .filter(|id| !id.is_empty())
            .ok_or(GatewayError::MissingField("thread_id"))?;
        tracing::debug!(session = %session_id, messages = payload.messages.len(), "session created");
        Ok(CreatedSession {
            session_id,
            messages: payload.messages,
        })
    }

    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        user_id: &str,
    ) -> Result<SendReceipt, GatewayError> {
        let query = [
            ("threadId", session_id),
            ("assistantId", self.config.assistant_id.as_str()),
            ("agentId", self.config.agent_id.as_str()),
            ("organizationId", self.config.organization_id.as_str()),
            ("userId", user_id),
        ];
        let body = SendMessageRequest {
            content: text,
            role: "user",
        };
        let reply: StatusResponse = self.post_json("createmessage", &query, &body).await?;
        let status = reply.status.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        Ok(SendReceipt { status })
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, GatewayError> {
        let reply: MessagesResponse = self.get_json(&format!("getmessages/{session_id}")).await?;
        Ok(reply.messages)
    }

    async fn create_history_entry(&self, session_id: &str, name: &str) -> Result<(), GatewayError> {
        let body = HistoryEntryRequest {
            agent_id: &self.config.agent_id,
            thread_id: session_id,
            name,
            source: HISTORY_SOURCE,
        };
        let _: serde_json::Value = self.post_json("create_chat_history", &[], &body).await?;
        Ok(())
    }
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, GatewayError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }
    serde_json::from_slice::<T>(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn format_http_error(status: StatusCode, body: &[u8]) -> GatewayError {
    let body = String::from_utf8_lossy(body).trim().to_string();
    GatewayError::Status {
        status: status.as_u16(),
        body: if body.is_empty() {
            "<empty>".to_string()
        } else {
            body
        },
    }
}
