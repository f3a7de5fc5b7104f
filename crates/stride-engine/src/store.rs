use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use stride_types::{ChatSession, Message, SessionId, SessionSummary};

/// Authoritative in-memory conversation state.
///
/// Holds the side-list summaries and the full histories of loaded sessions.
/// Every mutating operation is a single synchronous step that recomputes the
/// affected `SessionSummary` before returning, so summaries are never
/// observably stale relative to the message list. Only the engine mutates
/// this store.
pub struct SessionStore {
    sessions: HashMap<SessionId, ChatSession>,
    summaries: Vec<SessionSummary>,
    active: Option<SessionId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            summaries: Vec::new(),
            active: None,
        }
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.active.as_ref().and_then(|id| self.sessions.get(id))
    }

    pub fn session(&self, id: &SessionId) -> Option<&ChatSession> {
        self.sessions.get(id)
    }

    /// Side-list projections, newest first
    pub fn summaries(&self) -> &[SessionSummary] {
        &self.summaries
    }

    pub fn set_active(&mut self, id: Option<SessionId>) {
        self.active = id;
    }

    /// Insert or replace a full session
    pub fn upsert_session(&mut self, session: ChatSession) {
        let id = session.id.clone();
        self.sessions.insert(id.clone(), session);
        self.sync_summary(&id);
    }

    /// Append a user message, creating the session if it is not loaded yet
    pub fn append_user_message(&mut self, id: &SessionId, text: impl Into<String>) {
        let session = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| ChatSession::new(id.clone()));
        session.push_message(Message::user(text));
        self.sync_summary(id);
    }

    /// Start the assistant message for an in-flight stream with its first delta
    pub fn begin_assistant_message(&mut self, id: &SessionId, initial_text: impl Into<String>) {
        let session = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| ChatSession::new(id.clone()));
        session.push_message(Message::assistant(initial_text));
        self.sync_summary(id);
    }

    /// Append delta text to the assistant message under construction
    pub fn append_assistant_delta(&mut self, id: &SessionId, text: &str) {
        let Some(session) = self.sessions.get_mut(id) else {
            debug!(session = %id, "delta for unknown session dropped");
            return;
        };
        match session.messages.last_mut() {
            Some(last) if last.role == stride_types::ChatRole::Assistant => {
                last.content.push_str(text);
                session.updated_at = Utc::now();
            }
            _ => {
                debug!(session = %id, "delta without an open assistant message dropped");
                return;
            }
        }
        self.sync_summary(id);
    }

    /// Remove a partially-built assistant message after a failed stream.
    ///
    /// The preceding user message is retained; a truncated assistant reply
    /// is never left behind.
    pub fn rollback_assistant_message(&mut self, id: &SessionId) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        if matches!(
            session.messages.last(),
            Some(m) if m.role == stride_types::ChatRole::Assistant
        ) {
            session.messages.pop();
            session.updated_at = Utc::now();
            self.sync_summary(id);
        }
    }

    /// Move a session from a placeholder id to its server-assigned id.
    ///
    /// Idempotent; a no-op when `old == new` or when nothing is keyed under
    /// `old`. Messages move losslessly and the active pointer follows.
    pub fn rekey_session(&mut self, old: &SessionId, new: &SessionId) {
        if old == new {
            return;
        }
        let Some(mut session) = self.sessions.remove(old) else {
            return;
        };
        session.id = new.clone();
        self.sessions.insert(new.clone(), session);

        self.summaries.retain(|s| &s.id != old);
        self.sync_summary(new);

        if self.active.as_ref() == Some(old) {
            self.active = Some(new.clone());
        }
    }

    pub fn remove_session(&mut self, id: &SessionId) {
        self.sessions.remove(id);
        self.summaries.retain(|s| &s.id != id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
    }

    /// Drop all messages from a session, keeping the session itself
    pub fn clear_messages(&mut self, id: &SessionId) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.messages.clear();
            session.updated_at = Utc::now();
            self.sync_summary(id);
        }
    }

    /// Replace the side list with the server's authoritative view
    pub fn replace_summaries(&mut self, mut summaries: Vec<SessionSummary>) {
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.summaries = summaries;
    }

    /// Find an empty pending session to reuse for a new conversation
    pub fn reusable_pending(&self) -> Option<&SessionId> {
        self.sessions
            .values()
            .find(|s| s.id.is_pending() && s.messages.is_empty())
            .map(|s| &s.id)
    }

    fn sync_summary(&mut self, id: &SessionId) {
        let Some(session) = self.sessions.get(id) else {
            return;
        };
        let summary = session.summary();
        match self.summaries.iter_mut().find(|s| &s.id == id) {
            Some(slot) => *slot = summary,
            None => self.summaries.push(summary),
        }
        self.summaries
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
