//! # Stride
//!
//! Client-side streaming conversation engine for AI-assisted goal planning
//! chat: it sends user
//! messages, decodes the server's incremental event stream, reconstructs
//! complete assistant messages, and keeps a multi-session conversation
//! history consistent under partial failure.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use stride::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api = HttpChatApi::new("http://localhost:8080")?
//!         .with_session_type("goal_planning");
//!     let engine = ChatEngine::new(api);
//!
//!     let session = engine.send("I want to save $5000", None).await?;
//!     for message in &engine.session(&session).unwrap().messages {
//!         println!("{}: {}", message.role_str(), message.content);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - **stride-types**: data model (Message, ChatSession, SessionSummary)
//! - **stride-stream**: wire decoding and event interpretation
//! - **stride-client**: HTTP boundary (`ChatApi`, `HttpChatApi`)
//! - **stride-engine**: session store and the send state machine

pub use stride_client as client;
pub use stride_engine as engine;
pub use stride_stream as stream;
pub use stride_types as types;

pub mod prelude {
    pub use stride_client::{ChatApi, HttpChatApi};
    pub use stride_engine::{ChatEngine, EngineError, EngineState, SessionStore};
    pub use stride_stream::{FailReason, StreamEvent};
    pub use stride_types::{ChatRole, ChatSession, Message, SessionId, SessionSummary};
}
