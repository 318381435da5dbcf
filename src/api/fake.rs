//! In-process fake transport for unit tests
//!
//! [`FakeTransport`] implements [`Transport`] from scripted in-memory state
//! and records every call, so the orchestration layer can be tested without
//! a server. Chat and upload requests can be *held* in flight behind a gate
//! to observe intermediate state:
//!
//! ```text
//! fake.hold_chat();                 // next send_chat blocks
//! spawn(store.send("hi"));          // request recorded, then parked
//! fake.wait_for_chat_calls(1).await;
//! assert!(store.is_pending());
//! fake.release_chat(1);             // reply delivered
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::api::types::{
    Agent, ChatReply, ChatRequest, ChatTurn, Document, NewAgent, SessionInfo, TrainAck,
    TrainRequest, TrainingStatus,
};
use crate::api::Transport;
use crate::error::{AgentDeskError, Result};
use crate::upload::FileBlob;

#[derive(Debug, Default)]
struct FakeState {
    agents: HashMap<String, Agent>,
    sessions: HashMap<String, Vec<SessionInfo>>,
    histories: HashMap<String, Vec<ChatTurn>>,
    chat_replies: VecDeque<std::result::Result<ChatReply, String>>,
    chat_requests: Vec<ChatRequest>,
    failing_uploads: HashSet<String>,
    uploads: Vec<String>,
    documents: Option<Vec<Document>>,
    training: VecDeque<TrainingStatus>,
    training_calls: usize,
    history_calls: Vec<String>,
    agent_calls: usize,
    session_list_calls: usize,
    fail_agent: bool,
    fail_sessions: bool,
    fail_training: bool,
}

/// Scripted [`Transport`] for tests
#[derive(Debug, Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
    chat_gate: Mutex<Option<Arc<Semaphore>>>,
    upload_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeTransport {
    /// Create an empty fake; unscripted chat calls echo the message back
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("FakeTransport state poisoned")
    }

    /// Register an agent for `get_agent`
    pub fn with_agent(self, id: &str, name: &str, model: &str) -> Self {
        self.state().agents.insert(
            id.to_string(),
            Agent {
                id: id.to_string(),
                name: name.to_string(),
                model: model.to_string(),
                system_prompt: None,
                tools: vec![],
                document_ids: vec![],
            },
        );
        self
    }

    /// Register the session list of an agent (newest first)
    pub fn with_sessions(self, agent_id: &str, ids: &[&str]) -> Self {
        let sessions = ids
            .iter()
            .enumerate()
            .map(|(i, id)| SessionInfo {
                id: id.to_string(),
                created_at: format!("2024-01-{:02} 10:00:00", 28 - i),
                title: None,
            })
            .collect();
        self.state().sessions.insert(agent_id.to_string(), sessions);
        self
    }

    /// Register the stored transcript of a session
    pub fn with_history(self, session_id: &str, turns: Vec<ChatTurn>) -> Self {
        self.state()
            .histories
            .insert(session_id.to_string(), turns);
        self
    }

    /// Queue a successful chat reply
    pub fn push_reply(&self, reply: ChatReply) {
        self.state().chat_replies.push_back(Ok(reply));
    }

    /// Queue a failing chat reply
    pub fn push_chat_error(&self, message: &str) {
        self.state()
            .chat_replies
            .push_back(Err(message.to_string()));
    }

    /// Make uploads of this file name fail
    pub fn fail_upload(&self, name: &str) {
        self.state().failing_uploads.insert(name.to_string());
    }

    /// Let uploads of this file name succeed again
    pub fn heal_upload(&self, name: &str) {
        self.state().failing_uploads.remove(name);
    }

    /// Make `get_agent` fail
    pub fn fail_agent(&self, fail: bool) {
        self.state().fail_agent = fail;
    }

    /// Make `list_sessions` fail
    pub fn fail_sessions(&self, fail: bool) {
        self.state().fail_sessions = fail;
    }

    /// Make `training_status` fail
    pub fn fail_training(&self, fail: bool) {
        self.state().fail_training = fail;
    }

    /// Replace the session list of an agent after construction
    pub fn set_sessions(&self, agent_id: &str, sessions: Vec<SessionInfo>) {
        self.state()
            .sessions
            .insert(agent_id.to_string(), sessions);
    }

    /// Set the document list
    pub fn set_documents(&self, documents: Vec<Document>) {
        self.state().documents = Some(documents);
    }

    /// Queue training statuses; the last one repeats once the queue drains
    pub fn push_training(&self, status: TrainingStatus) {
        self.state().training.push_back(status);
    }

    /// Park subsequent `send_chat` calls until released
    pub fn hold_chat(&self) {
        *self.chat_gate.lock().expect("chat gate poisoned") = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `count` parked chat calls through
    pub fn release_chat(&self, count: usize) {
        if let Some(gate) = self.chat_gate.lock().expect("chat gate poisoned").as_ref() {
            gate.add_permits(count);
        }
    }

    /// Park subsequent `upload_document` calls until released
    pub fn hold_uploads(&self) {
        *self.upload_gate.lock().expect("upload gate poisoned") = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `count` parked uploads through
    pub fn release_uploads(&self, count: usize) {
        if let Some(gate) = self.upload_gate.lock().expect("upload gate poisoned").as_ref() {
            gate.add_permits(count);
        }
    }

    /// Every chat request received, in order
    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.state().chat_requests.clone()
    }

    /// File names of every upload attempt, in order
    pub fn uploads(&self) -> Vec<String> {
        self.state().uploads.clone()
    }

    /// Session ids whose history was fetched, in order
    pub fn history_calls(&self) -> Vec<String> {
        self.state().history_calls.clone()
    }

    /// Number of `get_agent` calls
    pub fn agent_calls(&self) -> usize {
        self.state().agent_calls
    }

    /// Number of `list_sessions` calls
    pub fn session_list_calls(&self) -> usize {
        self.state().session_list_calls
    }

    /// Number of `training_status` calls
    pub fn training_calls(&self) -> usize {
        self.state().training_calls
    }

    /// Wait until at least `count` chat requests have been received
    pub async fn wait_for_chat_calls(&self, count: usize) {
        self.wait_until(|state| state.chat_requests.len() >= count)
            .await
    }

    /// Wait until at least `count` uploads have been attempted
    pub async fn wait_for_uploads(&self, count: usize) {
        self.wait_until(|state| state.uploads.len() >= count).await
    }

    async fn wait_until(&self, condition: impl Fn(&FakeState) -> bool) {
        for _ in 0..500 {
            let reached = condition(&self.state());
            if reached {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("FakeTransport: condition not reached in time");
    }

    fn gate(slot: &Mutex<Option<Arc<Semaphore>>>) -> Option<Arc<Semaphore>> {
        slot.lock().expect("gate poisoned").clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        let mut agents: Vec<Agent> = self.state().agents.values().cloned().collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(agents)
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        let mut state = self.state();
        state.agent_calls += 1;
        if state.fail_agent {
            return Err(AgentDeskError::Transport("agent lookup failed".to_string()).into());
        }
        state.agents.get(agent_id).cloned().ok_or_else(|| {
            AgentDeskError::Api {
                status: 404,
                body: "Agent not found".to_string(),
            }
            .into()
        })
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<Agent> {
        let mut state = self.state();
        let created = Agent {
            id: format!("agent-{}", state.agents.len() + 1),
            name: agent.name.clone(),
            model: agent.model.clone(),
            system_prompt: Some(agent.system_prompt.clone()),
            tools: agent.tools.clone(),
            document_ids: agent.document_ids.clone(),
        };
        state.agents.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn list_sessions(&self, agent_id: &str) -> Result<Vec<SessionInfo>> {
        let mut state = self.state();
        state.session_list_calls += 1;
        if state.fail_sessions {
            return Err(AgentDeskError::Transport("session list failed".to_string()).into());
        }
        Ok(state.sessions.get(agent_id).cloned().unwrap_or_default())
    }

    async fn session_history(&self, session_id: &str) -> Result<Vec<ChatTurn>> {
        let mut state = self.state();
        state.history_calls.push(session_id.to_string());
        state.histories.get(session_id).cloned().ok_or_else(|| {
            AgentDeskError::Api {
                status: 404,
                body: "Session not found".to_string(),
            }
            .into()
        })
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.state().chat_requests.push(request.clone());

        if let Some(gate) = Self::gate(&self.chat_gate) {
            gate.acquire()
                .await
                .expect("chat gate closed")
                .forget();
        }

        let scripted = self.state().chat_replies.pop_front();
        match scripted {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(AgentDeskError::Api {
                status: 500,
                body: message,
            }
            .into()),
            None => Ok(ChatReply {
                response: format!("echo: {}", request.message),
                citations: None,
                session_id: None,
            }),
        }
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.state().documents.clone().unwrap_or_default())
    }

    async fn upload_document(&self, file: &FileBlob) -> Result<()> {
        self.state().uploads.push(file.name().to_string());

        if let Some(gate) = Self::gate(&self.upload_gate) {
            gate.acquire()
                .await
                .expect("upload gate closed")
                .forget();
        }

        if self.state().failing_uploads.contains(file.name()) {
            return Err(AgentDeskError::Api {
                status: 500,
                body: format!("could not ingest {}", file.name()),
            }
            .into());
        }
        Ok(())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let mut state = self.state();
        if let Some(documents) = state.documents.as_mut() {
            documents.retain(|d| d.id != document_id);
        }
        Ok(())
    }

    async fn training_status(&self) -> Result<TrainingStatus> {
        let mut state = self.state();
        state.training_calls += 1;
        if state.fail_training {
            return Err(AgentDeskError::Transport("status unavailable".to_string()).into());
        }
        let status = if state.training.len() > 1 {
            state.training.pop_front().unwrap_or_default()
        } else {
            state.training.front().cloned().unwrap_or_default()
        };
        Ok(status)
    }

    async fn start_training(&self, request: &TrainRequest) -> Result<TrainAck> {
        Ok(TrainAck {
            status: "started".to_string(),
            message: Some(format!("{} epochs of {}", request.epochs, request.model_name)),
        })
    }
}
