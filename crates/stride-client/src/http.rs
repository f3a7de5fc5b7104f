// HTTP implementation of the chat backend boundary

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use crate::traits::ChatApi;
use stride_stream::{event_stream, EventStream};
use stride_types::{ChatSession, SessionId, SessionSummary};

/// Chat backend client (HTTP direct, no SDK)
pub struct HttpChatApi {
    http_client: reqwest::Client,
    base_url: String,
    session_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_type: Option<&'a str>,
}

impl HttpChatApi {
    /// Create a new client against the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_type: None,
        })
    }

    /// Tag every new conversation with a session type (e.g. "goal_planning")
    pub fn with_session_type(mut self, session_type: impl Into<String>) -> Self {
        self.session_type = Some(session_type.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn open_stream(
        &self,
        message: &str,
        session_id: Option<&SessionId>,
    ) -> Result<EventStream> {
        // A pending id is a local placeholder; the server must assign one
        let session_id = session_id.filter(|id| !id.is_pending());
        debug!(session = session_id.map(SessionId::as_str), "opening chat stream");

        let body = StreamRequest {
            message,
            session_id: session_id.map(SessionId::as_str),
            session_type: self.session_type.as_deref(),
        };

        let response = self
            .http_client
            .post(self.url("/chat/stream"))
            .json(&body)
            .send()
            .await
            .context("Failed to open chat stream")?
            .error_for_status()
            .context("Chat stream request rejected")?;

        Ok(event_stream(response.bytes_stream()))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let response = self
            .http_client
            .get(self.url("/chat/sessions"))
            .send()
            .await
            .context("Failed to list sessions")?
            .error_for_status()?;

        response
            .json()
            .await
            .context("Failed to parse session list")
    }

    async fn fetch_session(&self, id: &SessionId) -> Result<ChatSession> {
        let response = self
            .http_client
            .get(self.url(&format!("/chat/sessions/{}", id)))
            .send()
            .await
            .with_context(|| format!("Failed to fetch session {}", id))?
            .error_for_status()?;

        response
            .json()
            .await
            .context("Failed to parse session history")
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        self.http_client
            .delete(self.url(&format!("/chat/sessions/{}", id)))
            .send()
            .await
            .with_context(|| format!("Failed to delete session {}", id))?
            .error_for_status()?;
        Ok(())
    }

    async fn clear_session(&self, id: &SessionId) -> Result<()> {
        self.http_client
            .post(self.url(&format!("/chat/sessions/{}/clear", id)))
            .send()
            .await
            .with_context(|| format!("Failed to clear session {}", id))?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let api = HttpChatApi::new("http://localhost:8080/").unwrap();
        assert_eq!(api.url("/chat/sessions"), "http://localhost:8080/chat/sessions");
    }

    #[test]
    fn test_stream_request_omits_absent_fields() {
        let body = StreamRequest {
            message: "hello",
            session_id: None,
            session_type: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"message":"hello"}"#);
    }

    #[test]
    fn test_stream_request_uses_camel_case() {
        let body = StreamRequest {
            message: "hello",
            session_id: Some("srv-1"),
            session_type: Some("goal_planning"),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"sessionId\":\"srv-1\""));
        assert!(json.contains("\"sessionType\":\"goal_planning\""));
    }
}
