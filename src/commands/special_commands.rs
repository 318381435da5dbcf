//! Special commands parser for the interactive chat
//!
//! Lines starting with `/` control the session instead of being sent to the
//! agent:
//! - Start a new conversation or switch to a stored session
//! - List sessions and reprint the transcript
//! - Show status and help
//! - Exit
//!
//! Command names are case-insensitive; session ids keep their case.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a fresh conversation with no session id
    NewChat,

    /// List the agent's stored sessions
    ListSessions,

    /// Switch to a stored session by id
    SwitchSession(String),

    /// Reprint the current transcript
    ShowHistory,

    /// Show agent, session and transcript status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the agent.
    None,
}

/// Parse a user input line into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognised `/command`,
/// `CommandError::MissingArgument` for `/switch` without an id and
/// `CommandError::UnsupportedArgument` when an argument-less command is given
/// one.
///
/// # Examples
///
/// ```
/// use agentdesk::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/switch Sess-42").unwrap(),
///     SpecialCommand::SwitchSession("Sess-42".to_string())
/// );
/// assert_eq!(parse_special_command("hello agent").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    let simple = |cmd: SpecialCommand| {
        if arg.is_empty() {
            Ok(cmd)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: command.clone(),
                arg: arg.to_string(),
            })
        }
    };

    match command.as_str() {
        "/new" => simple(SpecialCommand::NewChat),
        "/sessions" => simple(SpecialCommand::ListSessions),
        "/history" => simple(SpecialCommand::ShowHistory),
        "/status" => simple(SpecialCommand::ShowStatus),
        "/help" | "/?" => simple(SpecialCommand::Help),
        "/exit" | "/quit" => simple(SpecialCommand::Exit),
        "/switch" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/switch".to_string(),
                    usage: "/switch <session_id>".to_string(),
                })
            } else if arg.contains(char::is_whitespace) {
                Err(CommandError::UnsupportedArgument {
                    command: "/switch".to_string(),
                    arg: arg.to_string(),
                })
            } else {
                Ok(SpecialCommand::SwitchSession(arg.to_string()))
            }
        }
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

SESSIONS:
  /new            - Start a new conversation
  /sessions       - List stored sessions for this agent
  /switch <id>    - Switch to a stored session

SESSION INFORMATION:
  /history        - Reprint the current conversation
  /status         - Show agent, session and message count
  /help           - Show this help message
  /?              - Same as /help

SESSION CONTROL:
  /exit, exit     - Exit interactive mode
  /quit, quit     - Same as exit

NOTES:
  - Commands are case-insensitive (session ids are not)
  - Regular text (not starting with /) is sent to the agent
  - A new conversation gets its session id from the server on the first reply
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new() {
        assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
        assert_eq!(parse_special_command("  /NEW  ").unwrap(), SpecialCommand::NewChat);
    }

    #[test]
    fn test_parse_sessions_and_history() {
        assert_eq!(
            parse_special_command("/sessions").unwrap(),
            SpecialCommand::ListSessions
        );
        assert_eq!(
            parse_special_command("/history").unwrap(),
            SpecialCommand::ShowHistory
        );
    }

    #[test]
    fn test_parse_status_and_help() {
        assert_eq!(
            parse_special_command("/status").unwrap(),
            SpecialCommand::ShowStatus
        );
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "quit", "EXIT", "/exit", "/quit"] {
            assert_eq!(
                parse_special_command(input).unwrap(),
                SpecialCommand::Exit,
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_parse_switch_keeps_id_case() {
        assert_eq!(
            parse_special_command("/Switch AbC-123").unwrap(),
            SpecialCommand::SwitchSession("AbC-123".to_string())
        );
    }

    #[test]
    fn test_parse_switch_without_id() {
        let err = parse_special_command("/switch").unwrap_err();
        assert_eq!(
            err,
            CommandError::MissingArgument {
                command: "/switch".to_string(),
                usage: "/switch <session_id>".to_string(),
            }
        );
        assert!(parse_special_command("/switch   ").is_err());
    }

    #[test]
    fn test_parse_switch_with_extra_words() {
        assert!(matches!(
            parse_special_command("/switch a b"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
    }

    #[test]
    fn test_parse_argument_on_simple_command() {
        let err = parse_special_command("/new please").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnsupportedArgument {
                command: "/new".to_string(),
                arg: "please".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_special_command("/models list").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/models".to_string()));
        assert!(err.to_string().contains("/help"));
    }

    #[test]
    fn test_regular_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("what does /new do?").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(
            parse_special_command("exit the building").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_print_help_does_not_panic() {
        print_help();
    }
}
