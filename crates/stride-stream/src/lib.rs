pub mod buffering;
pub mod decode;
pub mod events;
pub mod interpreter;

pub use buffering::LineBuffer;
pub use decode::{event_stream, EventStream};
pub use events::{FailReason, StreamEvent, WirePayload};
pub use interpreter::Interpreter;
