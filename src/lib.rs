//! MDChat - terminal client library for the MD Agents chat backend
//!
//! This library provides the client side of a multi-conversation chat
//! application: a session controller that keeps conversations, the active
//! conversation, and its messages consistent across backend calls, and a
//! transcript exporter that lays messages out into paginated documents.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Session state, its reducer, and the session controller
//! - `backend`: Chat backend abstraction with HTTP and in-memory implementations
//! - `export`: Transcript layout and PDF/text rendering
//! - `storage`: The local logged-in flag
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mdchat::backend::{create_backend, ChatBackend};
//! use mdchat::{Config, SessionController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let backend: Arc<dyn ChatBackend> = Arc::from(create_backend(&config.backend)?);
//!     let mut session = SessionController::new(backend, config.session.clone(), false);
//!     session.startup().await;
//!     session.send_message("What are the symptoms of anemia?").await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{MdChatError, Result};
pub use export::TranscriptExporter;
pub use session::{SessionController, SessionState};

#[cfg(test)]
pub mod test_utils;
