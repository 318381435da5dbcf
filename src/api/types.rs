//! Wire types for the agent platform API
//!
//! Request and response bodies exchanged with the platform. Field names
//! follow the server's JSON (snake_case); unknown fields are ignored so the
//! client tolerates additive server changes.

use crate::chat::Role;
use crate::error::Result;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// An agent as returned by `GET /agents` and `GET /agents/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Server-assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Model the agent runs on
    pub model: String,
    /// System prompt, when the server includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Enabled tool names
    #[serde(default)]
    pub tools: Vec<String>,
    /// Knowledge base documents attached to the agent
    #[serde(default)]
    pub document_ids: Vec<String>,
}

/// Body of `POST /agents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAgent {
    /// Display name
    pub name: String,
    /// Model identifier
    pub model: String,
    /// System prompt
    pub system_prompt: String,
    /// Enabled tool names
    #[serde(default)]
    pub tools: Vec<String>,
    /// Knowledge base documents to attach
    #[serde(default)]
    pub document_ids: Vec<String>,
}

/// A stored chat session, as listed by `GET /chat/sessions/{agent_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Server-assigned session id
    pub id: String,
    /// Creation time as reported by the server
    #[serde(alias = "createdAt")]
    pub created_at: String,
    /// Optional title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SessionInfo {
    /// Creation time formatted for display (`YYYY-MM-DD HH:MM`)
    ///
    /// Accepts RFC 3339 timestamps as well as the SQL `YYYY-MM-DD HH:MM:SS`
    /// form; anything else is returned verbatim.
    ///
    /// # Examples
    ///
    /// ```
    /// use agentdesk::api::SessionInfo;
    ///
    /// let session = SessionInfo {
    ///     id: "s1".to_string(),
    ///     created_at: "2024-03-01 09:15:42".to_string(),
    ///     title: None,
    /// };
    /// assert_eq!(session.created_at_display(), "2024-03-01 09:15");
    /// ```
    pub fn created_at_display(&self) -> String {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.created_at) {
            return ts.format("%Y-%m-%d %H:%M").to_string();
        }
        for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(ts) = NaiveDateTime::parse_from_str(&self.created_at, pattern) {
                return ts.format("%Y-%m-%d %H:%M").to_string();
            }
        }
        self.created_at.clone()
    }
}

/// One `{role, content}` pair of chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who produced the turn
    pub role: Role,
    /// Turn text
    pub content: String,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Agent to talk to
    pub agent_id: String,
    /// The new user turn
    pub message: String,
    /// Every earlier turn of the transcript, oldest first
    pub history: Vec<ChatTurn>,
    /// Session to append to; absent asks the server to open a new one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Assistant answer
    pub response: String,
    /// Sources the answer drew on
    #[serde(default)]
    pub citations: Option<Vec<String>>,
    /// Session the exchange was stored in (set when the server opened one)
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A knowledge base document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Server-assigned identifier
    pub id: String,
    /// Original file name
    pub filename: String,
    /// Ingestion status (e.g. `indexed`)
    pub status: String,
    /// Number of indexed chunks
    #[serde(default)]
    pub chunks: u64,
}

/// Decode a `GET /documents` body
///
/// A server without document storage answers with a single placeholder
/// object carrying a `message` field instead of a list of documents; that
/// shape decodes to an empty list.
///
/// # Errors
///
/// Returns error if the body is neither a document list nor the placeholder
pub fn decode_document_list(body: serde_json::Value) -> Result<Vec<Document>> {
    let is_placeholder = body
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.as_object())
        .map(|first| first.contains_key("message"))
        .unwrap_or(false);

    if is_placeholder {
        tracing::debug!("Document list is a placeholder response; treating as empty");
        return Ok(Vec::new());
    }

    Ok(serde_json::from_value(body)?)
}

/// Fine-tuning job phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingPhase {
    /// No job has run
    #[default]
    Idle,
    /// A job is running
    Training,
    /// The last job finished
    Completed,
    /// Any phase this client does not know
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Training => write!(f, "training"),
            Self::Completed => write!(f, "completed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Response of `GET /ml/status`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingStatus {
    /// Current phase
    #[serde(default)]
    pub status: TrainingPhase,
    /// Current optimizer step
    #[serde(default)]
    pub step: Option<u64>,
    /// Total steps of the run
    #[serde(default)]
    pub total_steps: Option<u64>,
    /// Latest training loss
    #[serde(default)]
    pub loss: Option<f64>,
}

impl TrainingStatus {
    /// Fraction of the run completed, when step counters are known
    ///
    /// # Examples
    ///
    /// ```
    /// use agentdesk::api::{TrainingPhase, TrainingStatus};
    ///
    /// let status = TrainingStatus {
    ///     status: TrainingPhase::Training,
    ///     step: Some(25),
    ///     total_steps: Some(100),
    ///     loss: None,
    /// };
    /// assert_eq!(status.progress(), Some(0.25));
    /// ```
    pub fn progress(&self) -> Option<f64> {
        match (self.step, self.total_steps) {
            (Some(step), Some(total)) if total > 0 => Some((step.min(total)) as f64 / total as f64),
            _ => None,
        }
    }

    /// Whether the poller can stop watching
    pub fn is_finished(&self) -> bool {
        self.status == TrainingPhase::Completed
    }
}

/// Body of `POST /ml/train`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainRequest {
    /// Number of epochs
    pub epochs: u32,
    /// Base model to fine-tune
    pub model_name: String,
    /// Run the trainer without touching real weights
    #[serde(default)]
    pub mock: bool,
}

/// Response of `POST /ml/train`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainAck {
    /// Server status word (e.g. `started`)
    pub status: String,
    /// Human readable detail
    #[serde(default)]
    pub message: Option<String>,
}
