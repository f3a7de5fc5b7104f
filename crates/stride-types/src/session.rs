use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;

const PENDING_PREFIX: &str = "pending-";
const PREVIEW_MAX_CHARS: usize = 80;

/// Identity of a chat session.
///
/// A session starts life under a locally-generated `pending-<uuid>`
/// placeholder and is re-keyed once the server assigns a real id.
/// Pending ids are never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh local placeholder id
    pub fn pending() -> Self {
        Self(format!("{}{}", PENDING_PREFIX, Uuid::new_v4()))
    }

    pub fn is_pending(&self) -> bool {
        self.0.starts_with(PENDING_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One conversation thread with its full message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatSession {
    /// Create an empty session under the given id
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Create an empty session under a fresh pending id
    pub fn pending() -> Self {
        Self::new(SessionId::pending())
    }

    /// Append a message and bump `updated_at`
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Derive the side-list projection for this session.
    ///
    /// Recomputed on every mutation; never independently authoritative.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            updated_at: self.updated_at,
            message_count: self.messages.len(),
            last_message_preview: self.messages.last().map(|m| preview(&m.content)),
        }
    }
}

/// Lightweight projection of a session for the side list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_preview: Option<String>,
}

/// Truncate on a char boundary so multi-byte content can't split a preview
fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((idx, _)) => content[..idx].to_string(),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_id_detection() {
        let id = SessionId::pending();
        assert!(id.is_pending());

        let id = SessionId::new("srv-1");
        assert!(!id.is_pending());
    }

    #[test]
    fn test_pending_ids_are_unique() {
        assert_ne!(SessionId::pending(), SessionId::pending());
    }

    #[test]
    fn test_summary_tracks_messages() {
        let mut session = ChatSession::pending();
        assert_eq!(session.summary().message_count, 0);
        assert!(session.summary().last_message_preview.is_none());

        session.push_message(Message::user("I want to save $5000"));
        let summary = session.summary();
        assert_eq!(summary.message_count, 1);
        assert_eq!(
            summary.last_message_preview.as_deref(),
            Some("I want to save $5000")
        );
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long: String = "é".repeat(200);
        let mut session = ChatSession::pending();
        session.push_message(Message::assistant(long));
        let summary = session.summary();
        assert_eq!(
            summary.last_message_preview.unwrap().chars().count(),
            PREVIEW_MAX_CHARS
        );
    }

    #[test]
    fn test_session_id_serde_transparent() {
        let id = SessionId::new("srv-9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"srv-9\"");
    }
}
