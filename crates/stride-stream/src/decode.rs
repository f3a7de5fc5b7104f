use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::buffering::LineBuffer;
use crate::events::{FailReason, StreamEvent};
use crate::interpreter::Interpreter;

/// Lazy, pull-based sequence of semantic events for one send.
///
/// Always ends with exactly one terminal event (`Completed` or `Failed`).
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Decode a stream of byte fragments into semantic events.
///
/// Fragments are processed in strict arrival order; a record split across
/// any number of fragments decodes identically to the unsplit stream.
/// Transport-level fragment errors terminate the logical stream with
/// `Failed { Transport }`. Stream close without a `complete` or `error`
/// record (a trailing partial record included) is a protocol violation and
/// yields `Failed { Protocol }`.
pub fn event_stream<S, B, E>(fragments: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    Box::pin(async_stream::stream! {
        let mut fragments = Box::pin(fragments);
        let mut buffer = LineBuffer::new();
        let mut interpreter = Interpreter::new();

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(bytes) => {
                    buffer.extend(bytes.as_ref());

                    while let Some(record) = buffer.next_record() {
                        if let Some(event) = interpreter.interpret(&record) {
                            let terminal = event.is_terminal();
                            yield event;
                            if terminal {
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    yield StreamEvent::Failed {
                        reason: FailReason::Transport(e.to_string()),
                    };
                    return;
                }
            }
        }

        // Transport closed without a terminal record. Any buffered partial
        // record is discarded with it.
        yield StreamEvent::Failed {
            reason: FailReason::Protocol("stream closed before completion".to_string()),
        };
    })
}
