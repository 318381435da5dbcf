//! Session registry for one agent
//!
//! The registry knows the agent's persisted sessions, decides which one is
//! active, and owns the [`ConversationStore`] for it. Every change of
//! selection installs a brand-new store; the previous one is closed so a late
//! reply for it is dropped instead of landing in the new transcript.

use std::sync::Arc;

use crate::api::{Agent, SessionInfo, Transport};
use crate::chat::ConversationStore;
use crate::config::ChatConfig;

/// Which session the registry is pointing at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing selected yet
    NoSession,
    /// A server-known session is active
    Active(String),
    /// A new chat whose first message has not created a session yet
    New,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    Unselected,
    Session(String),
    New,
}

/// Session list and active conversation for an agent
#[derive(Debug)]
pub struct SessionRegistry {
    transport: Arc<dyn Transport>,
    agent_id: String,
    chat: ChatConfig,
    agent: Option<Agent>,
    sessions: Vec<SessionInfo>,
    selection: Selection,
    conversation: ConversationStore,
}

impl SessionRegistry {
    /// Create a registry for `agent_id` with nothing loaded and nothing selected
    pub fn new(transport: Arc<dyn Transport>, agent_id: impl Into<String>, chat: ChatConfig) -> Self {
        let agent_id = agent_id.into();
        let conversation = ConversationStore::new(Arc::clone(&transport), agent_id.clone(), &chat);
        Self {
            transport,
            agent_id,
            chat,
            agent: None,
            sessions: Vec::new(),
            selection: Selection::Unselected,
            conversation,
        }
    }

    /// Fetch agent metadata and the session list
    ///
    /// Both reads run concurrently. A failed read keeps the previous value
    /// and is logged. Once both have settled, the newest session is selected
    /// only if nothing is active yet and the transcript is untouched; a
    /// reload never moves the user off the conversation they are in.
    pub async fn load(&mut self) {
        let (agent, sessions) = tokio::join!(
            self.transport.get_agent(&self.agent_id),
            self.transport.list_sessions(&self.agent_id)
        );

        match agent {
            Ok(agent) => self.agent = Some(agent),
            Err(e) => tracing::warn!(agent_id = %self.agent_id, "Failed to load agent: {:#}", e),
        }
        match sessions {
            Ok(sessions) => {
                tracing::debug!(agent_id = %self.agent_id, count = sessions.len(), "Loaded sessions");
                self.sessions = sessions;
            }
            Err(e) => {
                tracing::warn!(agent_id = %self.agent_id, "Failed to load sessions: {:#}", e)
            }
        }

        if self.state() != SessionState::NoSession || !self.conversation.is_empty() {
            return;
        }
        if let Some(newest) = self.sessions.first().map(|s| s.id.clone()) {
            self.activate(newest).await;
        }
    }

    /// Make `session_id` the active session and load its transcript
    ///
    /// Selecting the session that is already active does nothing.
    pub async fn select_session(&mut self, session_id: &str) {
        self.activate(session_id.to_string()).await;
    }

    /// Switch to a fresh, empty conversation with no session id
    pub fn start_new(&mut self) {
        self.selection = Selection::New;
        self.replace_conversation();
        tracing::debug!(agent_id = %self.agent_id, "Started a new chat");
    }

    async fn activate(&mut self, session_id: String) {
        if self.state() == SessionState::Active(session_id.clone()) {
            return;
        }
        self.selection = Selection::Session(session_id.clone());
        self.replace_conversation();
        tracing::debug!(session_id = %session_id, "Switched session");
        self.conversation.load_history(&session_id).await;
    }

    fn replace_conversation(&mut self) {
        let fresh = ConversationStore::new(Arc::clone(&self.transport), self.agent_id.clone(), &self.chat);
        let old = std::mem::replace(&mut self.conversation, fresh);
        old.close();
    }

    /// Current selection
    ///
    /// A conversation that was not bound to a stored session reports
    /// `Active` as soon as the server has assigned its session id.
    pub fn state(&self) -> SessionState {
        let unbound = match &self.selection {
            Selection::Session(id) => return SessionState::Active(id.clone()),
            Selection::Unselected => SessionState::NoSession,
            Selection::New => SessionState::New,
        };
        match self.conversation.session_id() {
            Some(id) => SessionState::Active(id),
            None => unbound,
        }
    }

    /// Id of the active session, if any
    pub fn active_session_id(&self) -> Option<String> {
        match self.state() {
            SessionState::Active(id) => Some(id),
            SessionState::NoSession | SessionState::New => None,
        }
    }

    /// Sessions as last loaded, newest first
    pub fn sessions(&self) -> &[SessionInfo] {
        &self.sessions
    }

    /// Agent metadata, once loaded
    pub fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    /// Agent this registry belongs to
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Conversation of the active session
    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }
}
