use tracing::warn;

use crate::events::{FailReason, StreamEvent, WirePayload};
use stride_types::SessionId;

const DATA_MARKER: &str = "data: ";

/// Classifies raw records into `StreamEvent`s for one logical stream.
///
/// Stateful: tracks whether a session id has been assigned and whether any
/// content delta has been seen, so it can enforce the ordering invariant
/// (at most one `session_id` record, only before the first `chunk`). A
/// violation yields `Failed` and terminates the logical stream; records
/// after a terminal event are ignored.
pub struct Interpreter {
    assigned: bool,
    saw_delta: bool,
    terminated: bool,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            assigned: false,
            saw_delta: false,
            terminated: false,
        }
    }

    /// Whether a terminal event has been produced
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Interpret one raw record.
    ///
    /// Returns `None` for records that carry no event: empty lines, lines
    /// without the data marker, malformed JSON (logged and skipped), and
    /// unknown event types (skipped silently for forward compatibility).
    pub fn interpret(&mut self, record: &str) -> Option<StreamEvent> {
        if self.terminated {
            return None;
        }

        let record = record.trim();
        if record.is_empty() {
            return None;
        }

        let data = record.strip_prefix(DATA_MARKER)?;

        let payload: WirePayload = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(e) => {
                // A single corrupt record must not abort the stream
                warn!(error = %e, "skipping malformed stream record");
                return None;
            }
        };

        let event = match payload.kind.as_str() {
            "session_id" => {
                if self.saw_delta {
                    self.fail(FailReason::Protocol(
                        "session id assigned after content started".to_string(),
                    ))
                } else if self.assigned {
                    self.fail(FailReason::Protocol(
                        "session id assigned twice".to_string(),
                    ))
                } else {
                    match payload.session_id {
                        Some(id) => {
                            self.assigned = true;
                            StreamEvent::SessionAssigned {
                                id: SessionId::new(id),
                            }
                        }
                        None => self.fail(FailReason::Protocol(
                            "session id event without an id".to_string(),
                        )),
                    }
                }
            }
            "chunk" => {
                self.saw_delta = true;
                StreamEvent::ContentDelta {
                    text: payload.content.unwrap_or_default(),
                }
            }
            "complete" => {
                self.terminated = true;
                StreamEvent::Completed
            }
            "error" => self.fail(FailReason::Server(
                payload
                    .message
                    .unwrap_or_else(|| "unknown server error".to_string()),
            )),
            other => {
                warn!(kind = other, "ignoring unrecognized stream event type");
                return None;
            }
        };

        Some(event)
    }

    fn fail(&mut self, reason: FailReason) -> StreamEvent {
        self.terminated = true;
        StreamEvent::Failed { reason }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_becomes_delta() {
        let mut interp = Interpreter::new();
        let event = interp
            .interpret(r#"data: {"type":"chunk","content":"Great"}"#)
            .unwrap();
        assert_eq!(
            event,
            StreamEvent::ContentDelta {
                text: "Great".to_string()
            }
        );
    }

    #[test]
    fn test_session_id_before_content() {
        let mut interp = Interpreter::new();
        let event = interp
            .interpret(r#"data: {"type":"session_id","sessionId":"s1"}"#)
            .unwrap();
        assert_eq!(
            event,
            StreamEvent::SessionAssigned {
                id: SessionId::new("s1")
            }
        );
    }

    #[test]
    fn test_session_id_after_delta_is_protocol_error() {
        let mut interp = Interpreter::new();
        interp.interpret(r#"data: {"type":"chunk","content":"x"}"#);
        let event = interp
            .interpret(r#"data: {"type":"session_id","sessionId":"s1"}"#)
            .unwrap();
        assert!(matches!(
            event,
            StreamEvent::Failed {
                reason: FailReason::Protocol(_)
            }
        ));
        assert!(interp.is_terminated());
    }

    #[test]
    fn test_second_session_id_is_protocol_error() {
        let mut interp = Interpreter::new();
        interp.interpret(r#"data: {"type":"session_id","sessionId":"s1"}"#);
        let event = interp
            .interpret(r#"data: {"type":"session_id","sessionId":"s2"}"#)
            .unwrap();
        assert!(matches!(event, StreamEvent::Failed { .. }));
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        let mut interp = Interpreter::new();
        assert!(interp.interpret("data: {not json").is_none());
        // stream keeps going
        assert!(interp
            .interpret(r#"data: {"type":"chunk","content":"ok"}"#)
            .is_some());
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let mut interp = Interpreter::new();
        assert!(interp.interpret(r#"data: {"type":"heartbeat"}"#).is_none());
        assert!(!interp.is_terminated());
    }

    #[test]
    fn test_empty_and_unmarked_records_are_skipped() {
        let mut interp = Interpreter::new();
        assert!(interp.interpret("").is_none());
        assert!(interp.interpret(": comment").is_none());
        assert!(interp.interpret("event: custom").is_none());
    }

    #[test]
    fn test_error_event_surfaces_message_verbatim() {
        let mut interp = Interpreter::new();
        let event = interp
            .interpret(r#"data: {"type":"error","message":"model overloaded"}"#)
            .unwrap();
        assert_eq!(
            event,
            StreamEvent::Failed {
                reason: FailReason::Server("model overloaded".to_string())
            }
        );
    }

    #[test]
    fn test_records_after_terminal_are_ignored() {
        let mut interp = Interpreter::new();
        interp.interpret(r#"data: {"type":"complete"}"#);
        assert!(interp
            .interpret(r#"data: {"type":"chunk","content":"late"}"#)
            .is_none());
    }
}
