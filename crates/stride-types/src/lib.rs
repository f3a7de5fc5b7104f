pub mod message;
pub mod session;

pub use message::{ChatRole, Message};
pub use session::{ChatSession, SessionId, SessionSummary};
