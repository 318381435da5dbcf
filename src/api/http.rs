//! HTTP transport for the agent platform API
//!
//! Implements [`Transport`] with a shared `reqwest` client. Every request
//! carries the configured timeout and user agent; non-success statuses are
//! turned into [`AgentDeskError::Api`] with the response body attached.

use crate::api::types::{
    decode_document_list, Agent, ChatReply, ChatRequest, ChatTurn, Document, NewAgent,
    SessionInfo, TrainAck, TrainRequest, TrainingStatus,
};
use crate::api::Transport;
use crate::config::ApiConfig;
use crate::error::{AgentDeskError, Result};
use crate::upload::FileBlob;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// reqwest-backed platform client
///
/// # Examples
///
/// ```
/// use agentdesk::api::HttpTransport;
/// use agentdesk::config::ApiConfig;
///
/// let transport = HttpTransport::new(&ApiConfig::default()).unwrap();
/// assert_eq!(transport.base_url().as_str(), "http://localhost:8000/api/v1");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport from API settings
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse or cannot carry path
    /// segments, or if the HTTP client cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            AgentDeskError::Config(format!("Invalid API base URL {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AgentDeskError::Config(format!(
                "API base URL cannot carry paths: {}",
                config.base_url
            ))
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AgentDeskError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized platform transport: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// The API root all endpoints hang off
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AgentDeskError::Config(format!("API base URL cannot carry paths: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Pass a successful response through, turn anything else into an API error
    async fn check_status(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!("{} returned error {}: {}", what, status, body);
        Err(AgentDeskError::Api {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", what, e);
            AgentDeskError::Transport(format!("Failed to parse {} response: {}", what, e)).into()
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("{} request failed: {}", what, e);
            AgentDeskError::Transport(format!("{} request failed: {}", what, e))
        })?;
        let response = Self::check_status(response, what).await?;
        Self::decode(response, what).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B, what: &str) -> Result<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("{} request failed: {}", what, e);
                AgentDeskError::Transport(format!("{} request failed: {}", what, e))
            })?;
        let response = Self::check_status(response, what).await?;
        Self::decode(response, what).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.get_json(self.endpoint(&["agents"])?, "agent list").await
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.get_json(self.endpoint(&["agents", agent_id])?, "agent")
            .await
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<Agent> {
        self.post_json(self.endpoint(&["agents"])?, agent, "agent creation")
            .await
    }

    async fn list_sessions(&self, agent_id: &str) -> Result<Vec<SessionInfo>> {
        self.get_json(
            self.endpoint(&["chat", "sessions", agent_id])?,
            "session list",
        )
        .await
    }

    async fn session_history(&self, session_id: &str) -> Result<Vec<ChatTurn>> {
        self.get_json(
            self.endpoint(&["chat", "history", session_id])?,
            "session history",
        )
        .await
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        tracing::debug!(
            agent_id = %request.agent_id,
            session_id = ?request.session_id,
            history = request.history.len(),
            "Sending chat message"
        );
        self.post_json(self.endpoint(&["chat"])?, request, "chat")
            .await
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let body: serde_json::Value = self
            .get_json(self.endpoint(&["documents"])?, "document list")
            .await?;
        decode_document_list(body)
    }

    async fn upload_document(&self, file: &FileBlob) -> Result<()> {
        let url = self.endpoint(&["documents", "upload"])?;
        tracing::debug!(file = %file.name(), size = file.size(), "POST {}", url);

        let body = Body::from(file.bytes().clone());
        let part = Part::stream_with_length(body, file.size() as u64).file_name(file.name().to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Upload of {} failed: {}", file.name(), e);
                AgentDeskError::Transport(format!("Upload of {} failed: {}", file.name(), e))
            })?;
        Self::check_status(response, "document upload").await?;
        Ok(())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let url = self.endpoint(&["documents", document_id])?;
        tracing::debug!("DELETE {}", url);
        let response = self.client.delete(url).send().await.map_err(|e| {
            tracing::warn!("Document deletion failed: {}", e);
            AgentDeskError::Transport(format!("Document deletion failed: {}", e))
        })?;
        Self::check_status(response, "document deletion").await?;
        Ok(())
    }

    async fn training_status(&self) -> Result<TrainingStatus> {
        self.get_json(self.endpoint(&["ml", "status"])?, "training status")
            .await
    }

    async fn start_training(&self, request: &TrainRequest) -> Result<TrainAck> {
        self.post_json(self.endpoint(&["ml", "train"])?, request, "training start")
            .await
    }
}
