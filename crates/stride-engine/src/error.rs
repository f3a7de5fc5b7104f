use thiserror::Error;

use stride_stream::FailReason;
use stride_types::SessionId;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A send is already in flight; the call was rejected, not queued
    #[error("a send is already in flight")]
    Busy,

    /// The stream ended abnormally; the session was restored to a
    /// consistent state and nothing will be retried automatically
    #[error("stream failed: {0}")]
    Stream(FailReason),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("backend request failed: {0}")]
    Api(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
