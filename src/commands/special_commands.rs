//! Special commands parser for interactive chat mode
//!
//! This module parses the slash commands that can be entered during an
//! interactive chat session. Special commands allow users to:
//! - Start, list, select, and delete conversations
//! - Export the active conversation
//! - View session status and help
//! - Exit the session
//!
//! Command names are case-insensitive; arguments (conversation ids and
//! paths) keep their case.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::{ConversationId, SessionState};

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// A conversation named by list position or by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRef {
    /// 1-based position in the conversation list
    Index(usize),
    /// Backend conversation id
    Id(String),
}

impl ChatRef {
    /// Parse an argument; positive integers are list positions
    pub fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(n) if n > 0 => Self::Index(n),
            _ => Self::Id(arg.to_string()),
        }
    }

    /// Find the conversation this reference names
    ///
    /// # Examples
    ///
    /// ```
    /// use mdchat::commands::special_commands::ChatRef;
    /// use mdchat::session::{Conversation, SessionEvent, SessionState};
    ///
    /// let state = SessionState::new(false).apply(SessionEvent::ConversationsLoaded(vec![
    ///     Conversation::new("a", "First"),
    ///     Conversation::new("b", "Second"),
    /// ]));
    /// assert_eq!(ChatRef::parse("2").resolve(&state), Some("b".into()));
    /// assert_eq!(ChatRef::parse("a").resolve(&state), Some("a".into()));
    /// assert_eq!(ChatRef::parse("9").resolve(&state), None);
    /// ```
    pub fn resolve(&self, state: &SessionState) -> Option<ConversationId> {
        match self {
            Self::Index(n) => state.conversations.get(n - 1).map(|c| c.id.clone()),
            Self::Id(id) => {
                let id = ConversationId::new(id.as_str());
                state.contains(&id).then_some(id)
            }
        }
    }
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on the session rather than being sent to the
/// backend as a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Create a conversation and make it active
    NewChat,

    /// Show the conversation list
    ListChats,

    /// Make another conversation active
    SelectChat(ChatRef),

    /// Delete a conversation, the active one when no argument is given
    DeleteChat(Option<ChatRef>),

    /// Export the active conversation, optionally to a given path
    Export(Option<PathBuf>),

    /// Display session status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a chat message.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not a valid command.
/// Returns `CommandError::UnsupportedArgument` if a command that takes no argument receives one.
/// Returns `CommandError::MissingArgument` if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use mdchat::commands::special_commands::{parse_special_command, ChatRef, SpecialCommand};
///
/// let cmd = parse_special_command("/select 2").unwrap();
/// assert_eq!(cmd, SpecialCommand::SelectChat(ChatRef::Index(2)));
///
/// let cmd = parse_special_command("what causes a fever?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
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

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), Some(rest.trim())),
        None => (lower, None),
    };
    let arg = arg.filter(|a| !a.is_empty());

    let no_arg = |command: SpecialCommand| match arg {
        Some(extra) => Err(CommandError::UnsupportedArgument {
            command: name.clone(),
            arg: extra.to_string(),
        }),
        None => Ok(command),
    };

    match name.as_str() {
        "/new" => no_arg(SpecialCommand::NewChat),
        "/list" | "/chats" => no_arg(SpecialCommand::ListChats),
        "/select" | "/open" => match arg {
            Some(arg) => Ok(SpecialCommand::SelectChat(ChatRef::parse(arg))),
            None => Err(CommandError::MissingArgument {
                command: name.clone(),
                usage: "/select <N|ID>".to_string(),
            }),
        },
        "/delete" => Ok(SpecialCommand::DeleteChat(arg.map(ChatRef::parse))),
        "/export" => Ok(SpecialCommand::Export(arg.map(PathBuf::from))),
        "/status" => no_arg(SpecialCommand::ShowStatus),
        "/help" | "/?" => no_arg(SpecialCommand::Help),
        "/exit" | "/quit" => no_arg(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for the interactive session
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CONVERSATIONS:
  /new            - Start a new conversation
  /list           - List conversations (the active one is marked with *)
  /chats          - Same as /list
  /select <N|ID>  - Switch to conversation N from /list, or by id
  /delete [N|ID]  - Delete a conversation (default: the active one)

TRANSCRIPTS:
  /export [PATH]  - Export the active conversation (default: configured filename)

SESSION INFORMATION:
  /status         - Show the active conversation and backend status
  /help           - Show this help message
  /?              - Same as /help

SESSION CONTROL:
  exit            - Exit interactive mode
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
  - The first message in a new conversation becomes its title
"#
    );
}
