//! Error types for AgentDesk
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for AgentDesk operations
///
/// Covers configuration loading, HTTP transport failures, non-success
/// API responses and local file handling. The orchestration layer
/// (conversation, sessions, uploads) absorbs these errors into visible
/// state; they only surface to the caller from the outer command handlers.
#[derive(Error, Debug)]
pub enum AgentDeskError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The platform API answered with a non-success status
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code returned by the server
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// Transport-level failures (connection refused, timeout, bad body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Local upload preparation errors (unreadable file, size limit)
    #[error("Upload error: {0}")]
    Upload(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Line editor errors from the interactive chat
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for AgentDesk operations
///
/// Uses `anyhow::Error` so command handlers can attach context while
/// still carrying an [`AgentDeskError`] underneath.
pub type Result<T> = anyhow::Result<T>;
