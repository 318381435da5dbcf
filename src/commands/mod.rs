/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`      - Interactive chat with an agent
- `upload`    - Upload documents into the knowledge base
- `documents` - List and delete knowledge base documents
- `agents`    - List, show and create agents
- `sessions`  - List an agent's stored chat sessions
- `train`     - Start and monitor fine-tuning

Every handler receives the shared transport as `Arc<dyn Transport>` so tests
can drive them without a server.
*/

use crate::api::{Agent, Document, SessionInfo, Transport};
use crate::config::Config;
use crate::error::{AgentDeskError, Result};
use colored::Colorize;
use prettytable::{format, row, Table};
use std::sync::Arc;

// Special commands parser for the chat REPL
pub mod special_commands;

/// Truncate a string for table display
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn sessions_table(sessions: &[SessionInfo], active: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["".bold(), "ID".bold(), "Title".bold(), "Created".bold()]);

    for session in sessions {
        let marker = if active == Some(session.id.as_str()) {
            "*"
        } else {
            ""
        };
        let title = session.title.as_deref().unwrap_or("-");
        table.add_row(row![
            marker.green(),
            session.id.cyan(),
            truncate(title, 40),
            session.created_at_display()
        ]);
    }
    table
}

fn documents_table(documents: &[Document]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "ID".bold(),
        "Filename".bold(),
        "Status".bold(),
        "Chunks".bold()
    ]);
    for document in documents {
        table.add_row(row![
            document.id.cyan(),
            truncate(&document.filename, 40),
            document.status,
            document.chunks
        ]);
    }
    table
}

fn agents_table(agents: &[Agent]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "ID".bold(),
        "Name".bold(),
        "Model".bold(),
        "Documents".bold()
    ]);
    for agent in agents {
        table.add_row(row![
            agent.id.cyan(),
            truncate(&agent.name, 30),
            agent.model,
            agent.document_ids.len()
        ]);
    }
    table
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Loads the agent's sessions through a [`SessionRegistry`], then runs a
    //! readline loop that sends each line through the active conversation and
    //! prints the reply.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::chat::{Message, Role, SendOutcome, SessionRegistry, SessionState};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start an interactive chat with an agent
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `transport` - Platform transport
    /// * `agent_id` - Agent to talk to
    /// * `session` - Session to resume instead of the most recent one
    /// * `new` - Start with an empty conversation
    ///
    /// # Errors
    ///
    /// Returns error if the line editor cannot be initialised
    pub async fn run_chat(
        config: Config,
        transport: Arc<dyn Transport>,
        agent_id: String,
        session: Option<String>,
        new: bool,
    ) -> Result<()> {
        let mut registry = SessionRegistry::new(transport, agent_id, config.chat.clone());

        if new {
            registry.start_new();
        } else if let Some(id) = &session {
            registry.select_session(id).await;
        }
        registry.load().await;

        let mut rl = DefaultEditor::new().map_err(AgentDeskError::from)?;

        print_welcome_banner(&registry);
        if !registry.conversation().is_empty() {
            print_transcript(&registry.conversation().messages());
        }

        loop {
            match rl.readline(&format_prompt(&registry)) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => {}
                        Ok(command) => {
                            if !apply_special_command(&mut registry, command).await {
                                break;
                            }
                            continue;
                        }
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    }

                    rl.add_history_entry(trimmed)
                        .map_err(AgentDeskError::from)?;

                    let conversation = registry.conversation();
                    match conversation.send(trimmed).await {
                        SendOutcome::Replied | SendOutcome::Failed => {
                            if let Some(reply) = conversation.messages().last() {
                                println!("\n{}\n", render_message(reply));
                            }
                        }
                        SendOutcome::Discarded | SendOutcome::Ignored(_) => {
                            tracing::debug!("Message was not sent");
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Execute a special command against the registry
    ///
    /// Returns `false` when the session should end.
    pub(crate) async fn apply_special_command(
        registry: &mut SessionRegistry,
        command: SpecialCommand,
    ) -> bool {
        match command {
            SpecialCommand::NewChat => {
                registry.start_new();
                println!("{}\n", "Started a new conversation".green());
            }
            SpecialCommand::ListSessions => {
                registry.load().await;
                if registry.sessions().is_empty() {
                    println!("{}\n", "No stored sessions for this agent.".yellow());
                } else {
                    let active = registry.active_session_id();
                    sessions_table(registry.sessions(), active.as_deref()).printstd();
                    println!();
                }
            }
            SpecialCommand::SwitchSession(id) => {
                registry.select_session(&id).await;
                println!("{}\n", format!("Switched to session {}", id).green());
                print_transcript(&registry.conversation().messages());
            }
            SpecialCommand::ShowHistory => {
                print_transcript(&registry.conversation().messages());
            }
            SpecialCommand::ShowStatus => print_status(registry),
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit => return false,
            SpecialCommand::None => {}
        }
        true
    }

    /// Format one transcript entry for the terminal
    pub(crate) fn render_message(message: &Message) -> String {
        let label = match message.role() {
            Role::User => "you".cyan().bold(),
            Role::Assistant => "agent".green().bold(),
        };
        let mut out = format!("{}: {}", label, message.content());
        if let Some(citations) = message.citations() {
            if !citations.is_empty() {
                out.push_str(&format!("\n{} {}", "Sources:".dimmed(), citations.join(", ")));
            }
        }
        out
    }

    fn print_transcript(messages: &[Message]) {
        if messages.is_empty() {
            println!("{}\n", "(no messages yet)".dimmed());
            return;
        }
        for message in messages {
            println!("{}\n", render_message(message));
        }
    }

    fn session_label(registry: &SessionRegistry) -> String {
        match registry.state() {
            SessionState::NoSession => "no session".to_string(),
            SessionState::New => "new".to_string(),
            SessionState::Active(id) => id,
        }
    }

    pub(crate) fn format_prompt(registry: &SessionRegistry) -> String {
        let agent = registry
            .agent()
            .map(|a| a.name.as_str())
            .unwrap_or(registry.agent_id());
        format!("[{}|{}] >> ", agent, session_label(registry))
    }

    fn print_welcome_banner(registry: &SessionRegistry) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║               AgentDesk Interactive Chat                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        match registry.agent() {
            Some(agent) => println!("Agent:   {} ({})", agent.name.cyan(), agent.model),
            None => println!(
                "Agent:   {} {}",
                registry.agent_id().cyan(),
                "(details unavailable)".yellow()
            ),
        }
        println!("Session: {}\n", session_label(registry));
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    fn print_status(registry: &SessionRegistry) {
        let conversation = registry.conversation();
        println!("\n{}", "Chat Status".bold());
        println!("  Agent:    {}", registry.agent_id());
        if let Some(agent) = registry.agent() {
            println!("  Name:     {}", agent.name);
            println!("  Model:    {}", agent.model);
        }
        println!("  Session:  {}", session_label(registry));
        println!("  Messages: {}", conversation.len());
        println!("  Known sessions: {}\n", registry.sessions().len());
    }

}

// Upload command handler
pub mod upload {
    //! Document upload handler.

    use super::*;
    use crate::upload::{FileBlob, UploadPipeline, UploadReport, UploadStatus};
    use std::path::PathBuf;

    /// Upload files into the knowledge base, one at a time
    ///
    /// Files that cannot be read are reported and left out of the batch; the
    /// rest are uploaded even if some of them fail. The document list is
    /// printed once the batch completes.
    ///
    /// # Errors
    ///
    /// Returns error if no file could be read, or if any upload failed
    pub async fn run_upload(
        config: &Config,
        transport: Arc<dyn Transport>,
        files: Vec<PathBuf>,
    ) -> Result<UploadReport> {
        let mut blobs = Vec::with_capacity(files.len());
        for path in &files {
            match FileBlob::from_path(path, config.upload.max_file_size).await {
                Ok(blob) => blobs.push(blob),
                Err(e) => {
                    tracing::warn!("Skipping {}: {:#}", path.display(), e);
                    eprintln!("{}", format!("Skipping {}: {}", path.display(), e).red());
                }
            }
        }
        if blobs.is_empty() {
            return Err(AgentDeskError::Upload(
                "No readable files to upload".to_string(),
            )
            .into());
        }

        let pipeline = UploadPipeline::new(Arc::clone(&transport)).with_on_complete(|report| {
            tracing::info!(
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                "Upload batch complete"
            );
        });
        pipeline.add(blobs);

        println!("Uploading {} file(s)...", pipeline.len());
        let report = pipeline.run_all().await.unwrap_or_default();

        for item in pipeline.items() {
            let status = match item.status() {
                UploadStatus::Success => "uploaded".green(),
                UploadStatus::Error => "failed".red(),
                UploadStatus::Pending => "pending".yellow(),
            };
            println!("  {:<40} {}", truncate(item.name(), 40), status);
        }

        match transport.list_documents().await {
            Ok(documents) if !documents.is_empty() => {
                println!("\nKnowledge base:");
                documents_table(&documents).printstd();
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not refresh document list: {:#}", e),
        }
        println!();

        if !report.is_clean() {
            return Err(AgentDeskError::Upload(format!(
                "{} of {} uploads failed: {}",
                report.failed.len(),
                report.attempted(),
                report.failed.join(", ")
            ))
            .into());
        }
        Ok(report)
    }

}

// Documents command handler
pub mod documents {
    //! Knowledge base document handler.

    use super::*;
    use crate::cli::DocumentCommand;

    /// Handle `documents` subcommands
    ///
    /// # Errors
    ///
    /// Returns error if the platform request fails
    pub async fn handle_documents(transport: &dyn Transport, command: DocumentCommand) -> Result<()> {
        match command {
            DocumentCommand::List => {
                let documents = transport.list_documents().await?;
                if documents.is_empty() {
                    println!("{}", "No documents in the knowledge base.".yellow());
                    return Ok(());
                }
                println!("\nKnowledge base:");
                documents_table(&documents).printstd();
                println!();
            }
            DocumentCommand::Delete { id } => {
                transport.delete_document(&id).await?;
                println!("{}", format!("Deleted document {}", id).green());
            }
        }
        Ok(())
    }

}

// Agents command handler
pub mod agents {
    //! Agent management handler.

    use super::*;
    use crate::api::NewAgent;
    use crate::cli::AgentCommand;

    /// Handle `agents` subcommands
    ///
    /// # Errors
    ///
    /// Returns error if the platform request fails
    pub async fn handle_agents(transport: &dyn Transport, command: AgentCommand) -> Result<()> {
        match command {
            AgentCommand::List => {
                let agents = transport.list_agents().await?;
                if agents.is_empty() {
                    println!("{}", "No agents configured.".yellow());
                    return Ok(());
                }
                println!("\nAgents:");
                agents_table(&agents).printstd();
                println!();
                println!("Use {} to talk to one.", "agentdesk chat --agent <ID>".cyan());
            }
            AgentCommand::Show { id } => {
                let agent = transport.get_agent(&id).await?;
                print_agent(&agent);
            }
            AgentCommand::Create {
                name,
                model,
                system_prompt,
                tools,
                documents,
            } => {
                let request = NewAgent {
                    name,
                    model,
                    system_prompt,
                    tools,
                    document_ids: documents,
                };
                let agent = transport.create_agent(&request).await?;
                println!("{}", format!("Created agent {}", agent.id).green());
                print_agent(&agent);
            }
        }
        Ok(())
    }

    fn print_agent(agent: &Agent) {
        println!("\n{}", agent.name.bold());
        println!("  ID:        {}", agent.id.cyan());
        println!("  Model:     {}", agent.model);
        if let Some(prompt) = &agent.system_prompt {
            println!("  Prompt:    {}", truncate(prompt, 60));
        }
        if !agent.tools.is_empty() {
            println!("  Tools:     {}", agent.tools.join(", "));
        }
        if !agent.document_ids.is_empty() {
            println!("  Documents: {}", agent.document_ids.join(", "));
        }
        println!();
    }

}

// Sessions command handler
pub mod sessions {
    //! Session listing handler.

    use super::*;

    /// List the stored chat sessions of an agent, newest first
    ///
    /// # Errors
    ///
    /// Returns error if the platform request fails
    pub async fn list_sessions(transport: &dyn Transport, agent_id: &str) -> Result<()> {
        let sessions = transport.list_sessions(agent_id).await?;
        if sessions.is_empty() {
            println!("{}", format!("No sessions for agent {}.", agent_id).yellow());
            return Ok(());
        }
        println!("\nSessions for {}:", agent_id.cyan());
        sessions_table(&sessions, None).printstd();
        println!();
        println!(
            "Use {} to resume one.",
            format!("agentdesk chat --agent {} --session <ID>", agent_id).cyan()
        );
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::api::fake::FakeTransport;

        #[tokio::test]
        async fn test_list_sessions() {
            let fake = FakeTransport::new().with_sessions("a1", &["s2", "s1"]);
            assert!(list_sessions(&fake, "a1").await.is_ok());
            assert_eq!(fake.session_list_calls(), 1);
        }

        #[tokio::test]
        async fn test_list_sessions_failure_propagates() {
            let fake = FakeTransport::new();
            fake.fail_sessions(true);
            assert!(list_sessions(&fake, "a1").await.is_err());
        }
    }
}

// Training command handler
pub mod train {
    //! Fine-tuning handler.

    use super::*;
    use crate::api::{TrainRequest, TrainingStatus};
    use crate::cli::TrainCommand;
    use crate::training::{start_training, TrainingMonitor};

    /// Handle `train` subcommands
    ///
    /// # Errors
    ///
    /// Returns error if the platform request fails
    pub async fn handle_train(
        config: &Config,
        transport: Arc<dyn Transport>,
        command: TrainCommand,
    ) -> Result<()> {
        match command {
            TrainCommand::Start {
                epochs,
                model,
                mock,
            } => {
                let request = TrainRequest {
                    epochs: epochs.unwrap_or(config.training.epochs),
                    model_name: model.unwrap_or_else(|| config.training.model_name.clone()),
                    mock,
                };
                let ack = start_training(transport.as_ref(), &request).await?;
                println!(
                    "{}",
                    format!(
                        "Training {}: {} epoch(s) of {}",
                        ack.status, request.epochs, request.model_name
                    )
                    .green()
                );
                if let Some(message) = ack.message {
                    println!("  {}", message);
                }
            }
            TrainCommand::Status { watch: false } => {
                let status = transport.training_status().await?;
                println!("{}", format_status(&status));
            }
            TrainCommand::Status { watch: true } => {
                let mut monitor = TrainingMonitor::from_config(transport, &config.training);
                loop {
                    tokio::select! {
                        status = monitor.changed() => match status {
                            Some(status) => {
                                println!("{}", format_status(&status));
                                if status.is_finished() {
                                    break;
                                }
                            }
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => {
                            println!("CTRL-C");
                            break;
                        }
                    }
                }
                monitor.stop();
            }
        }
        Ok(())
    }

    /// One-line summary of a training status
    pub(crate) fn format_status(status: &TrainingStatus) -> String {
        let mut line = format!("Status: {}", status.status);
        if let (Some(step), Some(total)) = (status.step, status.total_steps) {
            line.push_str(&format!("  step {}/{}", step, total));
            if let Some(progress) = status.progress() {
                line.push_str(&format!(" ({:.0}%)", progress * 100.0));
            }
        }
        if let Some(loss) = status.loss {
            line.push_str(&format!("  loss {:.4}", loss));
        }
        line
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::api::fake::FakeTransport;
        use crate::api::TrainingPhase;

        #[test]
        fn test_format_status_full() {
            let status = TrainingStatus {
                status: TrainingPhase::Training,
                step: Some(5),
                total_steps: Some(20),
                loss: Some(0.51234),
            };
            assert_eq!(
                format_status(&status),
                "Status: training  step 5/20 (25%)  loss 0.5123"
            );
        }

        #[test]
        fn test_format_status_idle() {
            assert_eq!(format_status(&TrainingStatus::default()), "Status: idle");
        }

        #[tokio::test]
        async fn test_start_uses_config_defaults() {
            let fake = Arc::new(FakeTransport::new());
            let command = TrainCommand::Start {
                epochs: None,
                model: None,
                mock: true,
            };
            assert!(handle_train(&Config::default(), fake, command).await.is_ok());
        }

        #[tokio::test]
        async fn test_watch_stops_when_completed() {
            let fake = Arc::new(FakeTransport::new());
            fake.push_training(TrainingStatus {
                status: TrainingPhase::Completed,
                step: Some(10),
                total_steps: Some(10),
                loss: None,
            });
            let mut config = Config::default();
            config.training.poll_interval_ms = 5;

            handle_train(&config, fake.clone(), TrainCommand::Status { watch: true })
                .await
                .unwrap();
            assert!(fake.training_calls() >= 1);
        }
    }
}
