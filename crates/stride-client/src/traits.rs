use anyhow::Result;
use async_trait::async_trait;

use stride_stream::EventStream;
use stride_types::{ChatSession, SessionId, SessionSummary};

/// Boundary contract to the chat backend.
///
/// The engine depends on this trait only; `HttpChatApi` is the production
/// implementation and tests substitute scripted fakes.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send a message and open the response event stream.
    ///
    /// `session_id` is the existing server-side session to continue, if
    /// any. Pending ids must never be passed here; send `None` and let the
    /// server assign an id mid-stream.
    async fn open_stream(
        &self,
        message: &str,
        session_id: Option<&SessionId>,
    ) -> Result<EventStream>;

    /// List session summaries for the side list
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// Fetch one session's full message history
    async fn fetch_session(&self, id: &SessionId) -> Result<ChatSession>;

    /// Delete a session server-side
    async fn delete_session(&self, id: &SessionId) -> Result<()>;

    /// Remove all messages from a session server-side, keeping the session
    async fn clear_session(&self, id: &SessionId) -> Result<()>;
}
