//! Conversation store for a single chat session
//!
//! [`ConversationStore`] owns the transcript of one session and is the only
//! thing that appends to it. Sends are optimistic: the user message is
//! appended before the request goes out, and exactly one assistant message
//! (the reply, or a fixed error text) follows when it resolves.
//!
//! # Concurrency
//!
//! The store is a cheap `Clone` handle over shared state. The lock guarding
//! that state is never held across an await, so `pending` is observable while
//! a request is in flight and a second `send` during that window is ignored
//! rather than queued.
//!
//! # Cancellation
//!
//! Each store owns a [`CancellationToken`]. [`ConversationStore::close`]
//! cancels it; an in-flight send then resolves without touching the
//! transcript. The session registry closes a store when it replaces it, so a
//! late reply for an old session never leaks into the new one.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::api::{ChatRequest, Transport};
use crate::chat::Message;
use crate::config::ChatConfig;

/// Why a `send` call did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The text was empty or whitespace only
    EmptyInput,
    /// Another send is still in flight
    Busy,
    /// The store has been closed
    Closed,
}

/// Result of a [`ConversationStore::send`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant reply was appended
    Replied,
    /// The request failed and the error message was appended
    Failed,
    /// The store was closed while the request was in flight; nothing appended
    Discarded,
    /// Nothing happened
    Ignored(IgnoreReason),
}

#[derive(Debug, Default)]
struct ConversationState {
    log: Vec<Message>,
    pending: bool,
    session_id: Option<String>,
}

/// Transcript owner for one chat session
#[derive(Debug, Clone)]
pub struct ConversationStore {
    transport: Arc<dyn Transport>,
    agent_id: String,
    error_message: String,
    state: Arc<Mutex<ConversationState>>,
    cancel: CancellationToken,
}

impl ConversationStore {
    /// Create an empty store for an agent, not yet bound to a server session
    pub fn new(transport: Arc<dyn Transport>, agent_id: impl Into<String>, config: &ChatConfig) -> Self {
        Self {
            transport,
            agent_id: agent_id.into(),
            error_message: config.error_message.clone(),
            state: Arc::new(Mutex::new(ConversationState::default())),
            cancel: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        // Nothing panics while holding the lock; recover the data regardless.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send a user message and fold the outcome into the transcript
    ///
    /// Empty or whitespace-only text, a send already in flight, or a closed
    /// store make this a no-op. Otherwise the user message is appended
    /// immediately, the earlier transcript goes upstream as history, and
    /// exactly one assistant message is appended when the request resolves.
    /// Transport failures never escape: they become the configured error
    /// message in the transcript.
    pub async fn send(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        if self.cancel.is_cancelled() {
            return SendOutcome::Ignored(IgnoreReason::Closed);
        }

        let request = {
            let mut state = self.lock();
            if state.pending {
                tracing::debug!("Send ignored: a request is already in flight");
                return SendOutcome::Ignored(IgnoreReason::Busy);
            }

            let history = state.log.iter().map(Message::to_turn).collect();
            state.log.push(Message::user(text));
            state.pending = true;

            ChatRequest {
                agent_id: self.agent_id.clone(),
                message: text.to_string(),
                history,
                session_id: state.session_id.clone(),
            }
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.transport.send_chat(&request) => Some(result),
        };

        let mut state = self.lock();
        state.pending = false;

        let result = match result {
            Some(result) if !self.cancel.is_cancelled() => result,
            _ => {
                tracing::debug!(
                    session_id = ?state.session_id,
                    "Discarding chat response for a closed conversation"
                );
                return SendOutcome::Discarded;
            }
        };

        match result {
            Ok(reply) => {
                if state.session_id.is_none() {
                    if let Some(id) = reply.session_id {
                        tracing::info!(session_id = %id, "Server opened a new chat session");
                        state.session_id = Some(id);
                    }
                }
                state
                    .log
                    .push(Message::assistant_with_citations(reply.response, reply.citations));
                SendOutcome::Replied
            }
            Err(e) => {
                tracing::warn!(agent_id = %self.agent_id, "Chat request failed: {:#}", e);
                state.log.push(Message::assistant(self.error_message.clone()));
                SendOutcome::Failed
            }
        }
    }

    /// Replace the transcript with the stored history of a session
    ///
    /// Binds the store to `session_id` first, so later sends continue that
    /// session even if the history cannot be fetched (the transcript then
    /// stays empty). Returns whether the history was loaded.
    pub async fn load_history(&self, session_id: &str) -> bool {
        self.lock().session_id = Some(session_id.to_string());

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = self.transport.session_history(session_id) => result,
        };

        match result {
            Ok(turns) => {
                let mut state = self.lock();
                if self.cancel.is_cancelled() {
                    return false;
                }
                state.log = turns.into_iter().map(Message::from).collect();
                tracing::debug!(session_id, messages = state.log.len(), "Loaded session history");
                true
            }
            Err(e) => {
                tracing::warn!(session_id, "Failed to load session history: {:#}", e);
                false
            }
        }
    }

    /// Stop this store: in-flight sends are discarded and new ones ignored
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Snapshot of the transcript
    pub fn messages(&self) -> Vec<Message> {
        self.lock().log.clone()
    }

    /// Number of messages in the transcript
    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    /// Whether the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.lock().log.is_empty()
    }

    /// Whether a send is in flight
    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Server session this transcript belongs to, if one exists yet
    pub fn session_id(&self) -> Option<String> {
        self.lock().session_id.clone()
    }

    /// Agent this conversation talks to
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}
