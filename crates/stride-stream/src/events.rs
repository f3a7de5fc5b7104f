use serde::{Deserialize, Serialize};
use stride_types::SessionId;

/// Semantic events produced by interpreting the wire stream.
///
/// Closed set: every server record either maps onto exactly one variant or
/// is discarded by the interpreter. `Completed` and `Failed` are terminal
/// for the logical stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Server assigned a durable id to the session; at most one per send,
    /// always before the first content delta.
    SessionAssigned { id: SessionId },

    /// Incremental fragment of assistant response text
    ContentDelta { text: String },

    /// Response finished normally
    Completed,

    /// Logical stream ended abnormally
    Failed { reason: FailReason },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// Why a stream failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailReason {
    /// Connection refused or dropped mid-stream
    Transport(String),

    /// Malformed or out-of-order wire data
    Protocol(String),

    /// No event arrived within the engine's deadline
    Timeout,

    /// The server sent an explicit error event; message surfaced verbatim
    Server(String),
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Timeout => write!(f, "timed out waiting for stream event"),
            Self::Server(msg) => f.write_str(msg),
        }
    }
}

/// One decoded wire payload, before classification.
///
/// The server's record grammar is `data: <json>` where the JSON carries a
/// `type` discriminator. Kept as a plain struct (not a tagged enum) so
/// unknown `type` values deserialize fine and can be skipped for forward
/// compatibility.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_payload_chunk() {
        let payload: WirePayload =
            serde_json::from_str(r#"{"type":"chunk","content":"Great"}"#).unwrap();
        assert_eq!(payload.kind, "chunk");
        assert_eq!(payload.content.as_deref(), Some("Great"));
    }

    #[test]
    fn test_wire_payload_session_id_is_camel_case() {
        let payload: WirePayload =
            serde_json::from_str(r#"{"type":"session_id","sessionId":"s1"}"#).unwrap();
        assert_eq!(payload.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_wire_payload_unknown_type_still_parses() {
        let payload: WirePayload =
            serde_json::from_str(r#"{"type":"heartbeat","extra":42}"#).unwrap();
        assert_eq!(payload.kind, "heartbeat");
    }

    #[test]
    fn test_fail_reason_display_server_verbatim() {
        let reason = FailReason::Server("quota exceeded".to_string());
        assert_eq!(reason.to_string(), "quota exceeded");
    }
}
