//! AgentDesk - terminal client for an AI agent platform
//!
#![doc = "AgentDesk - terminal client for an AI agent platform"]
#![doc = "Main entry point for the AgentDesk application."]

use anyhow::Result;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agentdesk::api::{HttpTransport, Transport};
use agentdesk::cli::{Cli, Commands};
use agentdesk::commands;
use agentdesk::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/agentdesk.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.api)?);

    // Execute command
    match cli.command {
        Commands::Chat {
            agent,
            session,
            new,
        } => {
            tracing::info!("Starting interactive chat with agent {}", agent);
            if let Some(s) = &session {
                tracing::debug!("Resuming session: {}", s);
            }
            commands::chat::run_chat(config, transport, agent, session, new).await?;
            Ok(())
        }
        Commands::Upload { files } => {
            tracing::info!("Uploading {} file(s)", files.len());
            commands::upload::run_upload(&config, transport, files).await?;
            Ok(())
        }
        Commands::Documents { command } => {
            commands::documents::handle_documents(transport.as_ref(), command).await?;
            Ok(())
        }
        Commands::Agents { command } => {
            commands::agents::handle_agents(transport.as_ref(), command).await?;
            Ok(())
        }
        Commands::Sessions { agent } => {
            commands::sessions::list_sessions(transport.as_ref(), &agent).await?;
            Ok(())
        }
        Commands::Train { command } => {
            commands::train::handle_train(&config, transport, command).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "agentdesk=debug"
    } else {
        "agentdesk=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
