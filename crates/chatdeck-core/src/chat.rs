#![forbid(unsafe_code)]

//! Chat data model shared by the store, the gateway, and the views.
//!
//! Messages are immutable once stored. Ordering is by `created_at`, ties
//! broken by insertion order (see [`sort_messages`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Label used for sessions that have no user message yet.
pub const DEFAULT_SESSION_NAME: &str = "New Chat";

/// Maximum number of words kept in a derived session name.
pub const SESSION_NAME_WORDS: usize = 20;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Text value of a structured content segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentText {
    pub value: String,
}

/// One structured piece of message content, as returned by the hosted API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSegment {
    #[serde(rename = "type", default = "ContentSegment::default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<SegmentText>,
}

impl ContentSegment {
    fn default_kind() -> String {
        "text".to_string()
    }

    /// A plain text segment.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: Self::default_kind(),
            text: Some(SegmentText {
                value: value.into(),
            }),
        }
    }
}

/// Message body: either plain text or a list of structured segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Segments(Vec<ContentSegment>),
}

impl MessageContent {
    /// Flatten to display text. Segments are joined with a single space;
    /// segments without text contribute an empty string.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Segments(segments) => segments
                .iter()
                .map(|s| s.text.as_ref().map_or("", |t| t.value.as_str()))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        MessageContent::Text(value.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        MessageContent::Text(value)
    }
}

/// A single message in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: MessageContent,
    /// Creation time in unix seconds.
    pub created_at: i64,
}

impl ChatMessage {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        role: Role,
        content: impl Into<MessageContent>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            created_at,
        }
    }

    #[must_use]
    pub fn user(id: impl Into<String>, content: impl Into<MessageContent>, created_at: i64) -> Self {
        Self::new(id, Role::User, content, created_at)
    }

    #[must_use]
    pub fn assistant(
        id: impl Into<String>,
        content: impl Into<MessageContent>,
        created_at: i64,
    ) -> Self {
        Self::new(id, Role::Assistant, content, created_at)
    }

    /// Display text of the message.
    #[must_use]
    pub fn text(&self) -> String {
        self.content.to_text()
    }
}

/// A conversation with its full message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub display_name: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Index entry for a session (no messages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Stable sort by creation time; equal timestamps keep insertion order.
pub fn sort_messages(messages: &mut [ChatMessage]) {
    messages.sort_by_key(|m| m.created_at);
}

/// Derive a session name from the first user message.
///
/// Keeps the first [`SESSION_NAME_WORDS`] words and appends `...` when the
/// message is longer.
#[must_use]
pub fn session_name_from(messages: &[ChatMessage]) -> String {
    let Some(first_user) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_SESSION_NAME.to_string();
    };
    let text = first_user.text();
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return DEFAULT_SESSION_NAME.to_string();
    }
    let mut name = words
        .iter()
        .take(SESSION_NAME_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > SESSION_NAME_WORDS {
        name.push_str("...");
    }
    name
}

/// Truncate `label` to `max` grapheme clusters, appending `...` if cut.
#[must_use]
pub fn truncate_label(label: &str, max: usize) -> String {
    let mut graphemes = label.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_content_joins_with_space() {
        let content = MessageContent::Segments(vec![
            ContentSegment::text("hello"),
            ContentSegment {
                kind: "image".into(),
                text: None,
            },
            ContentSegment::text("world"),
        ]);
        assert_eq!(content.to_text(), "hello  world");
    }

    #[test]
    fn content_deserializes_from_string_or_segments() {
        let plain: MessageContent = serde_json::from_str(r#""hi""#).unwrap();
        assert_eq!(plain, MessageContent::Text("hi".into()));

        let segs: MessageContent =
            serde_json::from_str(r#"[{"type":"text","text":{"value":"hey"}}]"#).unwrap();
        assert_eq!(segs.to_text(), "hey");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, r#""assistant""#);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mut msgs = vec![
            ChatMessage::user("b", "second", 5),
            ChatMessage::user("a", "first", 1),
            ChatMessage::assistant("c", "third", 5),
        ];
        sort_messages(&mut msgs);
        let ids: Vec<_> = msgs.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn session_name_uses_first_user_message() {
        let msgs = vec![
            ChatMessage::assistant("1", "welcome", 0),
            ChatMessage::user("2", "  what is   rust ", 1),
        ];
        assert_eq!(session_name_from(&msgs), "what is rust");
    }

    #[test]
    fn session_name_truncates_long_messages() {
        let text = (1..=25).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let msgs = vec![ChatMessage::user("1", text, 0)];
        let name = session_name_from(&msgs);
        assert!(name.ends_with("20..."));
        assert!(!name.contains("21"));
    }

    #[test]
    fn session_name_defaults_without_user_message() {
        assert_eq!(session_name_from(&[]), DEFAULT_SESSION_NAME);
    }

    #[test]
    fn truncate_label_respects_graphemes() {
        assert_eq!(truncate_label("short", 25), "short");
        assert_eq!(truncate_label("abcdef", 3), "abc...");
        assert_eq!(truncate_label("héllo wörld", 5), "héllo...");
    }
}
