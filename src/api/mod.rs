//! Platform API transport abstraction
//!
//! This module defines the [`Transport`] trait through which every other
//! component talks to the agent platform. Concrete implementations live in
//! submodules:
//!
//! - [`http::HttpTransport`] -- reqwest client against the platform's
//!   versioned REST API.
//! - [`fake::FakeTransport`] -- in-process scripted fake used in tests
//!   (cfg(test) only).
//!
//! Each method maps to exactly one HTTP exchange. Timeouts, status checks
//! and body decoding are the implementation's responsibility; callers only
//! see `Ok` or an error.

use async_trait::async_trait;

use crate::error::Result;
use crate::upload::FileBlob;

pub mod http;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use http::HttpTransport;
pub use types::{
    decode_document_list, Agent, ChatReply, ChatRequest, ChatTurn, Document, NewAgent,
    SessionInfo, TrainAck, TrainRequest, TrainingPhase, TrainingStatus,
};

/// Abstraction over the agent platform API.
///
/// Used polymorphically through `Arc<dyn Transport>` so the orchestration
/// layer can be driven by a fake in tests.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// `GET /agents`
    async fn list_agents(&self) -> Result<Vec<Agent>>;

    /// `GET /agents/{id}`
    async fn get_agent(&self, agent_id: &str) -> Result<Agent>;

    /// `POST /agents`
    async fn create_agent(&self, agent: &NewAgent) -> Result<Agent>;

    /// `GET /chat/sessions/{agent_id}`, newest first
    async fn list_sessions(&self, agent_id: &str) -> Result<Vec<SessionInfo>>;

    /// `GET /chat/history/{session_id}`, oldest first
    async fn session_history(&self, session_id: &str) -> Result<Vec<ChatTurn>>;

    /// `POST /chat`
    ///
    /// # Errors
    ///
    /// Returns error on connection failure, timeout, non-success status or
    /// an undecodable body.
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// `GET /documents`; a placeholder body yields an empty list
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// `POST /documents/upload` with a single file
    ///
    /// Success is determined by HTTP status alone.
    async fn upload_document(&self, file: &FileBlob) -> Result<()>;

    /// `DELETE /documents/{id}`
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    /// `GET /ml/status`
    async fn training_status(&self) -> Result<TrainingStatus>;

    /// `POST /ml/train`
    async fn start_training(&self, request: &TrainRequest) -> Result<TrainAck>;
}
