//! Command-line interface definition for AgentDesk
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chat, document uploads, agents and fine-tuning.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AgentDesk - terminal client for an AI agent platform
///
/// Chat with agents, upload documents to the knowledge base and
/// watch fine-tuning jobs.
#[derive(Parser, Debug, Clone)]
#[command(name = "agentdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/agentdesk.yaml")]
    pub config: Option<String>,

    /// Override the platform API base URL (takes precedence over
    /// `AGENTDESK_API_URL`)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for AgentDesk
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat with an agent
    Chat {
        /// Agent to talk to
        #[arg(short, long)]
        agent: String,

        /// Resume a specific session instead of the most recent one
        #[arg(short, long, conflicts_with = "new")]
        session: Option<String>,

        /// Start a fresh conversation
        #[arg(short, long)]
        new: bool,
    },

    /// Upload documents into the knowledge base
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Manage knowledge base documents
    Documents {
        /// Document subcommand
        #[command(subcommand)]
        command: DocumentCommand,
    },

    /// Manage agents
    Agents {
        /// Agent subcommand
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// List the chat sessions of an agent
    Sessions {
        /// Agent whose sessions to list
        agent: String,
    },

    /// Start or monitor fine-tuning
    Train {
        /// Training subcommand
        #[command(subcommand)]
        command: TrainCommand,
    },
}

/// Document subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DocumentCommand {
    /// List uploaded documents
    List,

    /// Delete a document by id
    Delete {
        /// Document id
        id: String,
    },
}

/// Agent subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AgentCommand {
    /// List agents
    List,

    /// Show one agent
    Show {
        /// Agent id
        id: String,
    },

    /// Create an agent
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Model identifier
        #[arg(short, long, default_value = "gpt-3.5-turbo")]
        model: String,

        /// System prompt
        #[arg(long, default_value = "You are a helpful AI assistant.")]
        system_prompt: String,

        /// Tool names to enable (repeatable)
        #[arg(long = "tool")]
        tools: Vec<String>,

        /// Knowledge base documents to attach (repeatable)
        #[arg(long = "document")]
        documents: Vec<String>,
    },
}

/// Fine-tuning subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum TrainCommand {
    /// Start a training run
    Start {
        /// Number of epochs (defaults to config)
        #[arg(short, long)]
        epochs: Option<u32>,

        /// Base model (defaults to config)
        #[arg(short, long)]
        model: Option<String>,

        /// Run the trainer in mock mode
        #[arg(long)]
        mock: bool,
    },

    /// Show the training status
    Status {
        /// Keep polling until the job completes or CTRL-C
        #[arg(short, long)]
        watch: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/agentdesk.yaml".to_string()),
            api_url: None,
            verbose: false,
            command: Commands::Documents {
                command: DocumentCommand::List,
            },
        }
    }
}
