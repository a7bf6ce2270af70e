/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`     - Interactive chat session
- `history`  - List, show, and delete backend conversations
- `export`   - Write a conversation transcript to a document
- `auth`     - Set and clear the local logged-in flag

The interactive session never fails on backend errors; the one-shot
commands report them to the caller.
*/

use crate::error::Result;
use rustyline::DefaultEditor;

// Special commands parser for the interactive session
pub mod special_commands;

// Conversation listing, history, and deletion
pub mod history;

/// Whether a confirmation answer means yes
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Ask a yes/no question on the terminal; anything but yes is no
pub fn confirm(prompt: &str) -> Result<bool> {
    let mut rl = DefaultEditor::new()?;
    confirm_with(&mut rl, prompt)
}

fn confirm_with(rl: &mut DefaultEditor, prompt: &str) -> Result<bool> {
    match rl.readline(prompt) {
        Ok(answer) => Ok(is_affirmative(&answer)),
        Err(rustyline::error::ReadlineError::Interrupted)
        | Err(rustyline::error::ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds the backend and a `SessionController`, runs startup, and then
    //! reads lines with rustyline. Slash commands act on the session; any
    //! other line is sent as a chat message.

    use super::special_commands::{parse_special_command, print_help, ChatRef, SpecialCommand};
    use super::history::{conversation_table, print_message};
    use crate::backend::{create_backend, ChatBackend};
    use crate::config::Config;
    use crate::error::Result;
    use crate::export::TranscriptExporter;
    use crate::session::{
        ConversationId, DeleteOutcome, SendOutcome, SessionController, SessionState,
    };
    use crate::storage::AuthStore;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Shown while a reply is awaited
    const THINKING: &str = "MD Agent is thinking...";

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `resume` - Conversation to open instead of the most recent one
    pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let backend: Arc<dyn ChatBackend> = Arc::from(create_backend(&config.backend)?);
        if let Err(e) = backend.health().await {
            tracing::warn!("Backend health check failed: {}", e);
            println!(
                "{}",
                format!(
                    "Backend at {} is not responding; messages may fail.",
                    config.backend.base_url
                )
                .yellow()
            );
        }

        let logged_in = match AuthStore::new(config.storage.auth_file.as_deref()) {
            Ok(store) => store.is_logged_in(),
            Err(e) => {
                tracing::warn!("Could not open auth store: {}", e);
                false
            }
        };

        let mut session = SessionController::new(backend, config.session.clone(), logged_in);
        session.startup().await;

        if let Some(id) = resume {
            let id = ConversationId::new(id);
            if !session.select_chat(&id).await {
                println!(
                    "{}",
                    format!("Conversation {} not found; opened the most recent one.", id).yellow()
                );
            }
        }

        let exporter = TranscriptExporter::new(config.export.clone());
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(session.state());
        print_transcript(session.state());

        loop {
            let prompt = format_prompt(session.state());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::NewChat => {
                            match session.create_new_chat().await {
                                Some(id) => {
                                    println!("{}\n", format!("Started conversation {}", id).green())
                                }
                                None => eprintln!(
                                    "{}\n",
                                    "Could not create a conversation. Try again.".red()
                                ),
                            }
                            continue;
                        }
                        SpecialCommand::ListChats => {
                            print_conversations(session.state());
                            continue;
                        }
                        SpecialCommand::SelectChat(target) => {
                            handle_select(&mut session, &target).await;
                            continue;
                        }
                        SpecialCommand::DeleteChat(target) => {
                            handle_delete(&mut session, &mut rl, target.as_ref()).await?;
                            continue;
                        }
                        SpecialCommand::Export(path) => {
                            handle_export(&session, &exporter, path);
                            continue;
                        }
                        SpecialCommand::ShowStatus => {
                            print_status_display(session.state(), &config);
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            // Regular chat message
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    print!("{}", THINKING.dimmed());
                    std::io::stdout().flush()?;
                    let outcome = session.send_message(trimmed).await;
                    print!("\r\x1b[2K");

                    match outcome {
                        SendOutcome::Replied => {
                            if let Some(reply) = session.state().messages.last() {
                                println!();
                                print_message(reply);
                            }
                        }
                        SendOutcome::Failed => {
                            if let Some(error) = session.state().messages.last() {
                                eprintln!("\n{}\n", error.content.red());
                            }
                        }
                        SendOutcome::NoActiveConversation => {
                            eprintln!(
                                "{}\n",
                                "No active conversation. Use /new to start one.".yellow()
                            );
                        }
                        SendOutcome::Ignored => {}
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

    async fn handle_select(session: &mut SessionController, target: &ChatRef) {
        let Some(id) = target.resolve(session.state()) else {
            eprintln!(
                "{}\n",
                "No such conversation. Use /list to see conversations.".red()
            );
            return;
        };

        session.select_chat(&id).await;
        print_transcript(session.state());
    }

    async fn handle_delete(
        session: &mut SessionController,
        rl: &mut DefaultEditor,
        target: Option<&ChatRef>,
    ) -> Result<()> {
        let id = match target {
            Some(target) => target.resolve(session.state()),
            None => session.state().active_id.clone(),
        };
        let Some(id) = id else {
            eprintln!(
                "{}\n",
                "No such conversation. Use /list to see conversations.".red()
            );
            return Ok(());
        };

        let title = session
            .state()
            .conversation(&id)
            .map(|c| c.title.clone())
            .unwrap_or_default();
        if !super::confirm_with(rl, &format!("Delete \"{}\"? [y/N] ", title))? {
            println!("{}\n", "Cancelled.".yellow());
            return Ok(());
        }

        let was_active = session.state().active_id.as_ref() == Some(&id);
        match session.delete_chat(&id).await {
            DeleteOutcome::Deleted => println!("{}", format!("Deleted \"{}\"", title).green()),
            DeleteOutcome::LocalOnly => println!(
                "{}",
                format!(
                    "Removed \"{}\" locally; the backend could not be reached.",
                    title
                )
                .yellow()
            ),
        }

        if was_active {
            print_transcript(session.state());
        } else {
            println!();
        }
        Ok(())
    }

    fn handle_export(
        session: &SessionController,
        exporter: &TranscriptExporter,
        path: Option<PathBuf>,
    ) {
        let format = exporter.config().format;
        let path =
            path.unwrap_or_else(|| PathBuf::from(exporter.config().default_filename(format)));

        match exporter.export_to_file(&session.state().messages, &path, format) {
            Ok(pages) => println!(
                "{}\n",
                format!("Exported transcript to {} ({} pages)", path.display(), pages).green()
            ),
            Err(e) => eprintln!("{}\n", format!("Export failed: {}", e).red()),
        }
    }

    fn format_prompt(state: &SessionState) -> String {
        let title = state
            .active_conversation()
            .map(|c| c.title.as_str())
            .unwrap_or("no conversation");
        format!("{} >> ", format!("[{}]", title).cyan())
    }

    fn print_transcript(state: &SessionState) {
        if let Some(active) = state.active_conversation() {
            println!("{}\n", format!("── {} ──", active.title).bold());
        }
        for message in &state.messages {
            print_message(message);
        }
    }

    fn print_conversations(state: &SessionState) {
        if state.conversations.is_empty() {
            println!("{}\n", "No conversations. Use /new to start one.".yellow());
            return;
        }
        conversation_table(&state.conversations, state.active_id.as_ref()).printstd();
        println!();
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(state: &SessionState) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║            MD Agents Interactive Chat - Welcome!             ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Conversations: {}", state.conversations.len());
        if !state.logged_in {
            println!("{}", "Not logged in (run `mdchat login`).".dimmed());
        }
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Display detailed status information about the current session
    fn print_status_display(state: &SessionState, config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    MD Agents Session Status                  ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        match state.active_conversation() {
            Some(active) => {
                println!("Conversation:      {}", active.title.cyan());
                println!("Conversation ID:   {}", active.id);
            }
            None => println!("Conversation:      {}", "none".yellow()),
        }
        println!("Messages:          {}", state.messages.len());
        println!("Conversations:     {}", state.conversations.len());
        println!("Backend:           {}", config.backend.base_url);
        println!(
            "Logged In:         {}",
            if state.logged_in {
                "yes".green()
            } else {
                "no".yellow()
            }
        );
        println!();
    }
}

// Transcript export command handler
pub mod export {
    use super::history::fetch_messages;
    use crate::backend::create_backend;
    use crate::config::{Config, ExportFormat};
    use crate::error::Result;
    use crate::export::TranscriptExporter;
    use colored::Colorize;
    use std::path::PathBuf;

    /// Export a backend conversation to a document
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `id` - Conversation to export
    /// * `output` - Output path; the configured filename when `None`
    /// * `format` - Document format; the configured format when `None`
    pub async fn export_conversation(
        config: &Config,
        id: &str,
        output: Option<PathBuf>,
        format: Option<ExportFormat>,
    ) -> Result<PathBuf> {
        let format = format.unwrap_or(config.export.format);
        let path =
            output.unwrap_or_else(|| PathBuf::from(config.export.default_filename(format)));

        let backend = create_backend(&config.backend)?;
        let messages = fetch_messages(backend.as_ref(), id).await?;

        let exporter = TranscriptExporter::new(config.export.clone());
        let pages = exporter.export_to_file(&messages, &path, format)?;

        println!(
            "{}",
            format!(
                "Exported {} messages to {} ({} pages)",
                messages.len(),
                path.display(),
                pages
            )
            .green()
        );
        Ok(path)
    }
}

// Logged-in flag handlers
pub mod auth {
    use crate::config::Config;
    use crate::error::Result;
    use crate::storage::AuthStore;
    use colored::Colorize;

    /// Set or clear the logged-in flag
    pub fn set_logged_in(config: &Config, logged_in: bool) -> Result<()> {
        let store = AuthStore::new(config.storage.auth_file.as_deref())?;
        store.set_logged_in(logged_in)?;

        if logged_in {
            println!("{}", "Logged in.".green());
        } else {
            println!("{}", "Logged out.".green());
        }
        tracing::info!(path = %store.path().display(), logged_in, "Auth flag updated");
        Ok(())
    }
}
