//! AgentDesk - terminal client library for an AI agent platform
//!
//! This library provides the client side of a retrieval-augmented agent
//! platform: chatting with agents over persisted sessions, feeding documents
//! into the knowledge base, and watching fine-tuning jobs.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: Platform transport trait, HTTP implementation and wire types
//! - `chat`: Conversation store and session registry
//! - `upload`: Sequential document upload pipeline
//! - `training`: Fine-tuning status monitor
//! - `commands`: CLI command handlers and the chat REPL
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentdesk::api::HttpTransport;
//! use agentdesk::chat::SessionRegistry;
//! use agentdesk::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/agentdesk.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let transport = Arc::new(HttpTransport::new(&config.api)?);
//!     let mut registry = SessionRegistry::new(transport, "agent-1", config.chat.clone());
//!     registry.load().await;
//!     registry.conversation().send("What changed in the handbook?").await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod training;
pub mod upload;

// Re-export commonly used types
pub use api::{HttpTransport, Transport};
pub use chat::{ConversationStore, Message, Role, SessionRegistry, SessionState};
pub use config::Config;
pub use error::{AgentDeskError, Result};
pub use training::TrainingMonitor;
pub use upload::{FileBlob, UploadPipeline, UploadStatus};

#[cfg(test)]
pub mod test_utils;
