use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::store::SessionStore;
use stride_client::ChatApi;
use stride_stream::{FailReason, StreamEvent};
use stride_types::{ChatSession, SessionId, SessionSummary};

const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the engine is in the send lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    /// User message applied, stream opened, no event seen yet
    Sending,
    /// At least one event received
    Streaming,
}

/// Orchestrates sends against the chat backend and applies the resulting
/// event stream to the session store.
///
/// Sends are serialized globally: one stream may be in flight at a time,
/// and a `send` while non-idle is rejected with [`EngineError::Busy`]
/// rather than queued. Store mutations happen synchronously between stream
/// reads, in arrival order, with no await held across a mutation.
///
/// Dropping an in-flight `send` future abandons the stream: the transport
/// is closed and no further store mutation occurs for it, but the server
/// is not notified.
pub struct ChatEngine<A> {
    api: A,
    store: Arc<Mutex<SessionStore>>,
    state: Arc<Mutex<EngineState>>,
    event_timeout: Duration,
}

impl<A: ChatApi> ChatEngine<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            store: Arc::new(Mutex::new(SessionStore::new())),
            state: Arc::new(Mutex::new(EngineState::Idle)),
            event_timeout: DEFAULT_EVENT_TIMEOUT,
        }
    }

    /// Override the per-event deadline (default 30s). A stream that stays
    /// silent longer than this fails with a timeout instead of wedging.
    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    pub fn state(&self) -> EngineState {
        *lock(&self.state)
    }

    /// Snapshot of the currently active session
    pub fn active_session(&self) -> Option<ChatSession> {
        lock(&self.store).active_session().cloned()
    }

    /// Snapshot of one loaded session
    pub fn session(&self, id: &SessionId) -> Option<ChatSession> {
        lock(&self.store).session(id).cloned()
    }

    /// Snapshot of the side list, newest first
    pub fn summaries(&self) -> Vec<SessionSummary> {
        lock(&self.store).summaries().to_vec()
    }

    /// Send a user message and drive its response stream to completion.
    ///
    /// Targets `session_id` when given, otherwise the active session,
    /// otherwise a fresh pending session. The user message is applied
    /// optimistically before any network activity and is retained on
    /// failure; a partially-streamed assistant message is rolled back.
    /// Returns the session's id, re-keyed if the server assigned one
    /// mid-stream.
    pub async fn send(&self, text: &str, session_id: Option<SessionId>) -> Result<SessionId> {
        let _flight = self.begin_flight()?;

        // Resolve the target and apply the user message before the first
        // await, so the UI reflects it immediately.
        let target = {
            let mut store = lock(&self.store);
            let target = match session_id {
                Some(id) => id,
                None => match store.active_id() {
                    Some(id) => id.clone(),
                    None => {
                        let session = ChatSession::pending();
                        let id = session.id.clone();
                        store.upsert_session(session);
                        store.set_active(Some(id.clone()));
                        id
                    }
                },
            };
            store.append_user_message(&target, text);
            target
        };

        debug!(session = %target, "opening chat stream");
        let server_id = (!target.is_pending()).then(|| target.clone());
        let mut events = self
            .api
            .open_stream(text, server_id.as_ref())
            .await
            .map_err(|e| EngineError::Stream(FailReason::Transport(e.to_string())))?;

        let mut current_id = target;
        let mut assistant_started = false;

        loop {
            let event = match tokio::time::timeout(self.event_timeout, events.next()).await {
                Ok(Some(event)) => event,
                // The decode pipeline always ends with a terminal event, so
                // running dry here is itself a protocol violation.
                Ok(None) => StreamEvent::Failed {
                    reason: FailReason::Protocol("event stream ended unexpectedly".to_string()),
                },
                Err(_) => StreamEvent::Failed {
                    reason: FailReason::Timeout,
                },
            };

            if !matches!(event, StreamEvent::Failed { .. }) {
                *lock(&self.state) = EngineState::Streaming;
            }

            match event {
                StreamEvent::SessionAssigned { id } => {
                    debug!(old = %current_id, new = %id, "session id assigned");
                    lock(&self.store).rekey_session(&current_id, &id);
                    current_id = id;
                }
                StreamEvent::ContentDelta { text } => {
                    let mut store = lock(&self.store);
                    if assistant_started {
                        store.append_assistant_delta(&current_id, &text);
                    } else {
                        store.begin_assistant_message(&current_id, text);
                        assistant_started = true;
                    }
                }
                StreamEvent::Completed => {
                    drop(events);
                    // Server-side metadata (computed titles etc.) may differ
                    // from local projections; reconcile the side list.
                    match self.api.list_sessions().await {
                        Ok(summaries) => lock(&self.store).replace_summaries(summaries),
                        Err(e) => warn!(error = %e, "side-list reconciliation failed"),
                    }
                    return Ok(current_id);
                }
                StreamEvent::Failed { reason } => {
                    if assistant_started {
                        lock(&self.store).rollback_assistant_message(&current_id);
                    }
                    warn!(session = %current_id, reason = %reason, "stream failed");
                    return Err(EngineError::Stream(reason));
                }
            }
        }
    }

    /// Make a fresh pending session the active one.
    ///
    /// Reuses an existing empty pending session instead of creating a
    /// second live placeholder.
    pub fn new_conversation(&self) -> SessionId {
        let mut store = lock(&self.store);
        if let Some(id) = store.reusable_pending().cloned() {
            store.set_active(Some(id.clone()));
            return id;
        }
        let session = ChatSession::pending();
        let id = session.id.clone();
        store.upsert_session(session);
        store.set_active(Some(id.clone()));
        id
    }

    /// Load a session's full history and make it active.
    ///
    /// Permitted while a stream is in flight; the store is keyed by id and
    /// the in-flight stream keeps writing to its own session.
    pub async fn switch_to(&self, id: SessionId) -> Result<()> {
        if id.is_pending() {
            let mut store = lock(&self.store);
            if store.session(&id).is_none() {
                return Err(EngineError::SessionNotFound(id));
            }
            store.set_active(Some(id));
            return Ok(());
        }

        let session = self.api.fetch_session(&id).await?;
        let mut store = lock(&self.store);
        store.upsert_session(session);
        store.set_active(Some(id));
        Ok(())
    }

    /// Delete a session locally and server-side. Rejected while a send is
    /// in flight; holds the busy flag across the server call so a send
    /// cannot start against state this is about to remove.
    pub async fn delete(&self, id: SessionId) -> Result<()> {
        let _flight = self.begin_flight()?;
        if !id.is_pending() {
            self.api.delete_session(&id).await?;
        }
        lock(&self.store).remove_session(&id);
        Ok(())
    }

    /// Clear a session's messages locally and server-side. Rejected while
    /// a send is in flight; holds the busy flag across the server call so
    /// a send cannot start against state this is about to wipe.
    pub async fn clear(&self, id: SessionId) -> Result<()> {
        let _flight = self.begin_flight()?;
        if !id.is_pending() {
            self.api.clear_session(&id).await?;
        }
        lock(&self.store).clear_messages(&id);
        Ok(())
    }

    /// Refresh the side list from the server's session registry
    pub async fn refresh_sessions(&self) -> Result<()> {
        let summaries = self.api.list_sessions().await?;
        lock(&self.store).replace_summaries(summaries);
        Ok(())
    }

    /// Claim the engine for one in-flight operation, or reject with `Busy`.
    /// The returned guard restores `Idle` when dropped.
    fn begin_flight(&self) -> Result<FlightGuard> {
        let mut state = lock(&self.state);
        if *state != EngineState::Idle {
            return Err(EngineError::Busy);
        }
        *state = EngineState::Sending;
        Ok(FlightGuard {
            state: Arc::clone(&self.state),
        })
    }
}

/// Restores `Idle` when the claiming operation finishes or its future is
/// dropped mid-flight, so the engine can never stay wedged.
struct FlightGuard {
    state: Arc<Mutex<EngineState>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        *lock(&self.state) = EngineState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Poisoned only if a mutation panicked mid-step; state is unrecoverable
    mutex.lock().expect("engine lock poisoned")
}
