//! Command-line interface definition for MDChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, conversation management,
//! transcript export, and the local logged-in flag.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// MDChat - terminal client for the MD Agents chat backend
///
/// Chat with the medical and general assistant, browse and delete
/// conversations, and export transcripts to a document file.
#[derive(Parser, Debug, Clone)]
#[command(name = "mdchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL from config
    #[arg(long, env = "MDCHAT_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for MDChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Open this conversation instead of the most recent one
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// List conversations known to the backend
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the message history of a conversation
    History {
        /// Conversation id
        id: String,

        /// Print JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Delete a conversation
    Delete {
        /// Conversation id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export a conversation transcript to a document
    Export {
        /// Conversation id
        id: String,

        /// Output path (defaults to the configured export filename)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document format
        #[arg(short, long, value_enum)]
        format: Option<ExportFormatArg>,
    },

    /// Mark this machine as logged in
    Login,

    /// Clear the logged-in flag
    Logout,
}

/// Document formats selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormatArg {
    /// Paginated PDF document
    Pdf,
    /// Plain text, pages separated by form feeds
    Text,
}

impl From<ExportFormatArg> for crate::config::ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Pdf => Self::Pdf,
            ExportFormatArg::Text => Self::Text,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            backend_url: None,
            command: Commands::Chat { resume: None },
        }
    }
}
